mod local;
mod native;

pub use local::LocalStorage;
pub use native::NativePreferences;
