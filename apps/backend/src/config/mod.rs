pub mod app;

pub use app::SignupConfig;
