/// Backend trait, draw requests and the backend factory.
pub mod backend;
/// X11 child-window backend.
pub mod native;
/// External renderer process backend.
pub mod process;
