pub mod paths;

pub use paths::ProjectPaths;
