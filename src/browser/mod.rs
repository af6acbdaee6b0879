pub mod chrome;
pub mod session;

pub use chrome::ChromeSession;
pub use session::{BrowserSession, WaitCondition};

#[cfg(test)]
pub use session::MockBrowserSession;
