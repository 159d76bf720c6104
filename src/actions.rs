use crossterm::event::KeyEvent;

use crate::ipc::Inbound;

/// Actions that can be dispatched through the application
#[derive(Debug, Clone)]
pub enum Action {
    /// A key was pressed
    KeyPress(KeyEvent),
    /// Something arrived from the worker
    Inbound(Inbound),
    /// Periodic timer, used to expire notices
    Tick,
    /// Bind to the worker
    Connect,
    /// Release the worker
    Disconnect,
    /// Request to quit the application
    Quit,
}
