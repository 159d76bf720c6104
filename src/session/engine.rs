use std::time::Instant;
use tracing::{debug, info, warn};

use super::manager::ConnectionManager;
#[cfg(test)]
use super::manager::LinkState;
use super::view::{Screen, NOTICE_TTL};
use crate::ipc::{
    Connector, Inbound, Inbox, LinkId, Message, MessageKind, ReplyAddress, ServiceTarget,
};

/// Notice shown when the worker has nothing to run
pub const NO_CONFIG_TO_RUN: &str = "No configuration to run";

/// One client/worker conversation, alive as long as the UI
#[derive(Debug)]
pub struct Session {
    /// Configuration started by the last run request, shown as the title once it produces output
    pub active_config: Option<String>,
    reply_to: ReplyAddress,
}

impl Session {
    pub fn new() -> (Self, Inbox) {
        let (reply_to, inbox) = ReplyAddress::open();
        (
            Self {
                active_config: None,
                reply_to,
            },
            inbox,
        )
    }

    pub fn reply_to(&self) -> &ReplyAddress {
        &self.reply_to
    }
}

/// Turns user intents into outbound messages and inbound messages into screen updates
pub struct SessionEngine<C: Connector> {
    manager: ConnectionManager<C>,
    session: Session,
    screen: Screen,
}

impl<C: Connector> SessionEngine<C> {
    /// Create the engine together with the inbox its replies arrive on
    pub fn new(connector: C, target: ServiceTarget, default_title: &str) -> (Self, Inbox) {
        let (session, inbox) = Session::new();
        (
            Self {
                manager: ConnectionManager::new(connector, target),
                session,
                screen: Screen::new(default_title),
            },
            inbox,
        )
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.manager.is_bound()
    }

    #[cfg(test)]
    pub fn link_state(&self) -> LinkState {
        self.manager.state()
    }

    // ---- connection lifecycle ----

    /// Bind to the worker and ask for its configurations.
    /// Failures leave the session unconnected.
    pub async fn connect(&mut self) -> bool {
        if self.manager.is_bound() {
            return true;
        }
        match self.manager.connect(self.session.reply_to()).await {
            Ok(()) => {
                self.request_list();
                true
            }
            Err(e) => {
                warn!("Staying disconnected: {}", e);
                false
            }
        }
    }

    /// Release the channel and clear what the UI shows. Idempotent.
    pub fn disconnect(&mut self) {
        if self.manager.disconnect() {
            self.screen.clear_views();
            self.screen.cancel_notice();
            self.screen.close_prompt();
        }
    }

    pub fn on_peer_lost(&mut self, link: LinkId) {
        self.manager.on_peer_lost(link);
    }

    // ---- outbound ----

    /// Ask the worker for its run configurations
    pub fn request_list(&mut self) {
        self.manager.send(Message::empty(MessageKind::List));
    }

    /// Stop any previous run and start `name`
    pub fn request_run(&mut self, name: &str) {
        info!(config = name, "Starting run");
        self.screen.clear_views();
        self.request_terminate();
        self.screen.reset_title();
        self.session.active_config = Some(name.to_string());
        self.manager
            .send(Message::new(MessageKind::Run, name.as_bytes()));
    }

    pub fn request_terminate(&mut self) {
        self.manager.send(Message::empty(MessageKind::Terminate));
    }

    /// Send text to the running process's input
    pub fn append_input(&mut self, text: &str) {
        self.manager
            .send(Message::new(MessageKind::Append, text.as_bytes()));
    }

    /// Edit the input buffer; a completed line is sent and the buffer cleared
    pub fn edit_input(&mut self, edit: impl FnOnce(&mut String)) {
        edit(&mut self.screen.input);
        if self.screen.input.contains('\n') {
            let text = std::mem::take(&mut self.screen.input);
            self.append_input(&text);
        }
    }

    // ---- selection prompt ----

    /// Run the configuration at `index` in the open prompt
    pub fn choose(&mut self, index: usize) {
        let Some(prompt) = self.screen.close_prompt() else {
            return;
        };
        if let Some(name) = prompt.names.get(index) {
            self.request_run(name);
        }
    }

    /// Run whatever the prompt cursor is on
    pub fn choose_selected(&mut self) {
        if let Some(index) = self.screen.prompt().map(|p| p.selected) {
            self.choose(index);
        }
    }

    pub fn cancel_prompt(&mut self) {
        self.screen.close_prompt();
    }

    // ---- inbound ----

    /// Handle one delivery from the worker. Called in arrival order on the UI thread.
    pub fn dispatch(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::PeerLost(link) => self.on_peer_lost(link),
            Inbound::Message(message) => {
                debug!(kind = ?message.kind, "Dispatching inbound message");
                match message.kind {
                    MessageKind::List => self.on_list(&message),
                    MessageKind::Append => self.on_append(&message),
                    MessageKind::Trace => self.on_trace(&message),
                    MessageKind::Run | MessageKind::Terminate => self.on_unhandled(&message),
                }
            }
        }
    }

    fn on_list(&mut self, message: &Message) {
        let mut names = split_names(&message.text());
        if names.is_empty() {
            self.screen.show_notice(NO_CONFIG_TO_RUN);
            return;
        }

        if names.len() == 1 {
            let name = names.remove(0);
            self.request_run(&name);
            return;
        }

        self.screen.cancel_notice();
        self.screen.open_prompt(names);
    }

    fn on_append(&mut self, message: &Message) {
        if message.payload.is_empty() {
            // Output before any run request keeps whatever title is showing
            if let Some(name) = &self.session.active_config {
                self.screen.title = name.clone();
            }
            return;
        }
        self.screen.append_output(&message.text());
    }

    fn on_trace(&mut self, message: &Message) {
        self.screen.show_notice(message.text());
    }

    fn on_unhandled(&mut self, message: &Message) {
        debug!(kind = ?message.kind, "Ignoring message kind from worker");
    }

    /// Let the current notice lapse once it has been shown long enough
    pub fn tick(&mut self, now: Instant) {
        self.screen.expire_notice(now, NOTICE_TTL);
    }
}

/// Split a List payload into names. Interior empty names are kept, trailing ones dropped.
fn split_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = text.split('\n').map(str::to_string).collect();
    while names.last().is_some_and(|name| name.is_empty()) {
        names.pop();
    }
    names
}
