mod native;
mod noop;

pub use native::{ChromeCommand, NativeStatusBar};
pub use noop::NoopChrome;
