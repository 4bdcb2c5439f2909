#![forbid(unsafe_code)]

//! Elm/Bubbletea-style runtime: the event → message → update → frame loop.
//!
//! The [`Program`] owns a single root [`Model`], a bounded message queue, a
//! bookkeeping table of in-flight background commands, a [`BufferManager`],
//! and a [`FramerateLimiter`]. Terminal lifecycle (raw mode, alternate
//! screen, mouse tracking) is owned by [`ftui_core::terminal_session::TerminalSession`];
//! the Program only reads events from it and writes frames through a
//! [`Presenter`].
//!
//! # Example
//!
//! ```ignore
//! use ftui_core::event::Event;
//! use ftui_render::render_node::RenderNode;
//! use ftui_runtime::program::{Cmd, EventOutcome, Model, Program};
//! use ftui_runtime::ProgramConfig;
//!
//! struct Counter {
//!     count: i32,
//! }
//!
//! enum Msg {
//!     Increment,
//!     Quit,
//! }
//!
//! impl Model for Counter {
//!     type Message = Msg;
//!
//!     fn event_to_msg(&self, event: &Event) -> EventOutcome<Msg> {
//!         match event {
//!             Event::Key(k) if k.is_char('q') => EventOutcome::Msg(Msg::Quit),
//!             Event::Key(k) if k.is_char('+') => EventOutcome::Msg(Msg::Increment),
//!             _ => EventOutcome::Ignore,
//!         }
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Cmd<Msg> {
//!         match msg {
//!             Msg::Increment => {
//!                 self.count += 1;
//!                 Cmd::none()
//!             }
//!             Msg::Quit => Cmd::quit(),
//!         }
//!     }
//!
//!     fn view(&self) -> RenderNode {
//!         RenderNode::Text(self.count.to_string(), None)
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use ftui_core::event::Event;
use ftui_core::terminal_capabilities::TerminalCapabilities;
use ftui_core::terminal_session::{SessionOptions, TerminalSession};
use ftui_render::buffer_manager::BufferManager;
use ftui_render::presenter::Presenter;
use ftui_render::render_node::{self, RenderNode};

use crate::errors::RuntimeError;
use crate::framerate_limiter::FramerateLimiter;
use crate::subscription::{Subscription, SubscriptionManager};
use crate::ProgramConfig;

/// Outcome of routing one [`Event`] through [`Model::event_to_msg`].
///
/// The source architecture this runtime is modeled on distinguishes `ignore`
/// from `propagate` (forward to a parent component); this runtime manages a
/// single root component, so there is no parent to propagate to and the two
/// collapse into one variant.
#[derive(Debug)]
pub enum EventOutcome<M> {
    /// Route `m` through `update`.
    Msg(M),
    /// Drop the event; state is unchanged.
    Ignore,
}

/// Application state and behavior, in the Elm architecture's vocabulary.
pub trait Model: Sized {
    /// The message type driving this model's `update` function.
    type Message: Send + 'static;

    /// Initialize the model with startup commands.
    ///
    /// Called once when the program starts. Return commands to execute
    /// initial side effects like loading data.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// Translate a terminal event into a message, or decide to ignore it.
    fn event_to_msg(&self, event: &Event) -> EventOutcome<Self::Message>;

    /// Update the model in response to a message.
    ///
    /// This is the core state transition function. Returns commands
    /// for any side effects that should be executed.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    /// Render the current state to a [`RenderNode`] tree.
    ///
    /// Called once per render tick when the model is dirty.
    fn view(&self) -> RenderNode;

    /// Declare active subscriptions.
    ///
    /// Called after each `update()`. The runtime compares the returned set
    /// (by `SubId`) against currently running subscriptions and starts/stops
    /// as needed. Returning an empty vec stops all subscriptions.
    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Self::Message>>> {
        vec![]
    }
}

/// Commands represent side effects to be executed by the runtime.
///
/// Commands are returned from `init()` and `update()` to trigger actions
/// like quitting or running a background task.
pub enum Cmd<M> {
    /// No operation.
    None,
    /// Quit the application.
    Quit,
    /// Execute multiple commands. A `Quit` anywhere in the batch stops the
    /// remaining commands in the batch from running.
    Batch(Vec<Cmd<M>>),
    /// Immediately enqueue a message, without going through a background task.
    Msg(M),
    /// Run `run` on a background thread. If it has not completed within
    /// `timeout`, the entry is dropped from `pending_commands`; if
    /// `on_timeout` is set, its message is enqueued first.
    Task {
        /// The work to perform off the runtime thread.
        run: Box<dyn FnOnce() -> M + Send>,
        /// Optional deadline; `None` means no timeout.
        timeout: Option<Duration>,
        /// Message to enqueue if `run` does not complete within `timeout`.
        on_timeout: Option<Box<dyn FnOnce() -> M + Send>>,
    },
}

impl<M> Default for Cmd<M> {
    fn default() -> Self {
        Cmd::None
    }
}

impl<M: std::fmt::Debug> std::fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Task { timeout, .. } => f.debug_struct("Task").field("timeout", timeout).finish(),
        }
    }
}

impl<M> Cmd<M> {
    /// Create a no-op command.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::None
    }

    /// Create a quit command.
    #[inline]
    #[must_use]
    pub fn quit() -> Self {
        Self::Quit
    }

    /// Create a message command.
    #[inline]
    #[must_use]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    /// Create a batch of commands, collapsing the common empty/singleton cases.
    #[must_use]
    pub fn batch(cmds: Vec<Self>) -> Self {
        if cmds.is_empty() {
            Self::None
        } else if cmds.len() == 1 {
            cmds.into_iter().next().expect("non-empty vec has at least one element")
        } else {
            Self::Batch(cmds)
        }
    }

    /// Create a background task with no timeout.
    #[must_use]
    pub fn task<F>(f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task {
            run: Box::new(f),
            timeout: None,
            on_timeout: None,
        }
    }

    /// Create a background task with a timeout and a fallback message.
    #[must_use]
    pub fn task_with_timeout<F, T>(timeout: Duration, f: F, on_timeout: T) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
        T: FnOnce() -> M + Send + 'static,
    {
        Self::Task {
            run: Box::new(f),
            timeout: Some(timeout),
            on_timeout: Some(Box::new(on_timeout)),
        }
    }

    /// Count the number of atomic (non-`Batch`) commands this resolves to.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Batch(cmds) => cmds.iter().map(Self::count).sum(),
            _ => 1,
        }
    }
}

type CommandId = u64;

struct PendingCommand<M> {
    registered_at: Instant,
    timeout: Option<Duration>,
    on_timeout: Option<Box<dyn FnOnce() -> M + Send>>,
}

/// Bounded FIFO of pending messages. Overflow drops the newest message and
/// is counted rather than panicking or blocking.
struct MessageQueue<M> {
    items: std::collections::VecDeque<M>,
    max_size: Option<usize>,
    dropped: u64,
}

impl<M> MessageQueue<M> {
    fn new(max_size: Option<usize>) -> Self {
        Self {
            items: std::collections::VecDeque::new(),
            max_size,
            dropped: 0,
        }
    }

    fn push(&mut self, msg: M) {
        if let Some(max) = self.max_size {
            if self.items.len() >= max {
                self.dropped += 1;
                return;
            }
        }
        self.items.push_back(msg);
    }

    fn drain(&mut self) -> Vec<M> {
        self.items.drain(..).collect()
    }
}

/// Drives a [`Model`] to completion: reads terminal events, dispatches
/// messages, executes commands, and renders frames at a paced rate.
pub struct Program<M: Model, W: Write> {
    model: M,
    config: ProgramConfig,
    queue: MessageQueue<M::Message>,
    pending: HashMap<CommandId, PendingCommand<M::Message>>,
    next_command_id: CommandId,
    command_tx: mpsc::Sender<(CommandId, M::Message)>,
    command_rx: mpsc::Receiver<(CommandId, M::Message)>,
    subscriptions: SubscriptionManager<M::Message>,
    buffers: BufferManager,
    presenter: Presenter<W>,
    limiter: FramerateLimiter,
    terminal: TerminalSession,
    dirty: bool,
    shutting_down: bool,
}

impl<M: Model> Program<M, std::io::Stdout> {
    /// Construct a program writing to standard output, sizing its buffers
    /// from the current terminal size.
    pub fn new(model: M, config: ProgramConfig) -> Result<Self, RuntimeError> {
        Self::with_writer(model, config, std::io::stdout())
    }
}

impl<M: Model, W: Write> Program<M, W> {
    /// Construct a program writing frames to `writer`.
    pub fn with_writer(model: M, config: ProgramConfig, writer: W) -> Result<Self, RuntimeError> {
        let terminal = TerminalSession::new(SessionOptions {
            alternate_screen: config.alternate_screen,
            mouse_capture: config.mouse_capture,
            bracketed_paste: config.bracketed_paste,
            ..Default::default()
        })
        .map_err(RuntimeError::Terminal)?;

        let (cols, rows) = terminal.size().map_err(RuntimeError::Terminal)?;
        let buffers = BufferManager::new(rows as usize, cols as usize).map_err(RuntimeError::Render)?;

        let mut presenter = Presenter::new(writer);
        presenter.set_sync_output(true);

        let (command_tx, command_rx) = mpsc::channel();

        Ok(Self {
            model,
            queue: MessageQueue::new(config.max_queue_size),
            pending: HashMap::new(),
            next_command_id: 0,
            command_tx,
            command_rx,
            subscriptions: SubscriptionManager::new(),
            buffers,
            presenter,
            limiter: FramerateLimiter::new(config.target_fps),
            terminal,
            dirty: true,
            shutting_down: false,
            config,
        })
    }

    /// Run the program until a `Cmd::Quit` is processed or the terminal
    /// input stream ends. Restores terminal state on every exit path via
    /// `TerminalSession`'s `Drop` impl.
    pub fn run(mut self) -> Result<(), RuntimeError> {
        let init_cmd = self.model.init();
        self.dispatch(init_cmd);
        self.reconcile_subscriptions();
        self.render_immediate()?;

        while !self.shutting_down {
            let poll_timeout = self.limiter.time_until_next_tick().min(Duration::from_millis(50));
            if self.terminal.poll_event(poll_timeout).map_err(RuntimeError::Terminal)? {
                if let Some(event) = self.terminal.read_event().map_err(RuntimeError::Terminal)? {
                    self.handle_event(event);
                }
            }
            self.drain_command_results();
            self.expire_timed_out_commands();
            self.process_messages();

            if self.limiter.poll() {
                self.render_tick()?;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Resize { width, height } = event {
            self.handle_resize(width, height);
            return;
        }
        match self.model.event_to_msg(&event) {
            EventOutcome::Msg(m) => self.queue.push(m),
            EventOutcome::Ignore => {}
        }
    }

    fn handle_resize(&mut self, width: u16, height: u16) {
        if self.buffers.resize(height as usize, width as usize).is_err() {
            crate::warn!(width, height, "resize rejected: dimensions too large");
            return;
        }
        let _ = self.presenter.clear_screen();
        if let EventOutcome::Msg(m) = self.model.event_to_msg(&Event::Resize { width, height }) {
            self.queue.push(m);
        }
        self.dirty = true;
        let _ = self.render_tick();
    }

    fn dispatch(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.begin_shutdown(),
            Cmd::Batch(cmds) => {
                for c in cmds {
                    if self.shutting_down {
                        break;
                    }
                    self.dispatch(c);
                }
            }
            Cmd::Msg(m) => self.queue.push(m),
            Cmd::Task { run, timeout, on_timeout } => self.spawn_task(run, timeout, on_timeout),
        }
    }

    fn spawn_task(
        &mut self,
        run: Box<dyn FnOnce() -> M::Message + Send>,
        timeout: Option<Duration>,
        on_timeout: Option<Box<dyn FnOnce() -> M::Message + Send>>,
    ) {
        let id = self.next_command_id;
        self.next_command_id += 1;
        self.pending.insert(
            id,
            PendingCommand {
                registered_at: Instant::now(),
                timeout,
                on_timeout,
            },
        );
        let tx = self.command_tx.clone();
        std::thread::spawn(move || {
            let msg = run();
            let _ = tx.send((id, msg));
        });
    }

    fn drain_command_results(&mut self) {
        while let Ok((id, msg)) = self.command_rx.try_recv() {
            if self.pending.remove(&id).is_some() {
                self.queue.push(msg);
            }
        }
    }

    fn expire_timed_out_commands(&mut self) {
        let now = Instant::now();
        let expired: Vec<CommandId> = self
            .pending
            .iter()
            .filter_map(|(id, pending)| {
                let timeout = pending.timeout?;
                if now.saturating_duration_since(pending.registered_at) >= timeout {
                    Some(*id)
                } else {
                    None
                }
            })
            .collect();
        for id in expired {
            if let Some(pending) = self.pending.remove(&id) {
                crate::debug!(command_id = id, "background task timed out");
                if let Some(on_timeout) = pending.on_timeout {
                    self.queue.push(on_timeout());
                }
            }
        }
    }

    fn process_messages(&mut self) {
        let drained = {
            let subscription_msgs = self.subscriptions.drain_messages();
            for m in subscription_msgs {
                self.queue.push(m);
            }
            self.queue.drain()
        };
        if drained.is_empty() {
            return;
        }
        let mut commands = Vec::with_capacity(drained.len());
        for msg in drained {
            let cmd = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.model.update(msg)));
            match cmd {
                Ok(cmd) => commands.push(cmd),
                Err(_) => {
                    crate::error!("model update panicked; state frozen at last good value");
                }
            }
            self.dirty = true;
        }
        self.reconcile_subscriptions();
        for cmd in commands {
            if self.shutting_down {
                break;
            }
            self.dispatch(cmd);
        }
    }

    fn reconcile_subscriptions(&mut self) {
        let subs = self.model.subscriptions();
        self.subscriptions.reconcile(subs);
    }

    fn begin_shutdown(&mut self) {
        self.shutting_down = true;
        self.queue.items.clear();
        self.pending.clear();
        self.subscriptions.stop_all();
    }

    fn render_immediate(&mut self) -> Result<(), RuntimeError> {
        self.dirty = true;
        self.render_tick()
    }

    fn render_tick(&mut self) -> Result<(), RuntimeError> {
        self.process_messages();
        if !self.dirty || self.shutting_down {
            return Ok(());
        }
        let start = Instant::now();

        let tree = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.model.view())) {
            Ok(tree) => tree,
            Err(_) => {
                crate::error!("model view panicked; substituting render error placeholder");
                RenderNode::Text("[Render Error]".to_string(), None)
            }
        };

        self.buffers.current_mut().clear();
        render_node::rasterize(&tree, self.buffers.current_mut(), 1, 1, Default::default());

        self.presenter
            .present(self.buffers.current(), self.buffers.previous())
            .map_err(RuntimeError::Io)?;
        self.presenter.flush().map_err(RuntimeError::Io)?;

        self.buffers.swap_buffers();
        self.dirty = false;
        self.limiter.record_render_time(start.elapsed());
        Ok(())
    }
}
