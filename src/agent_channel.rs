//! Line-based pipe to one agent process.
//!
//! An [`AgentChannel`] launches the agent, performs the handshake and answers per-tick queries.
//! Lines are written and replies are read by two dedicated threads, so that a query as a whole
//! can be bounded by a timeout. An agent that stops reading its input fails the same way as one
//! that stops answering.

use std::{
    io::{self, BufRead, BufReader, BufWriter, Write},
    process::{ChildStdin, ChildStdout},
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Context};
use tracing::{debug, instrument, trace, warn};

use crate::{
    action::Action, agent::Agent, configuration::Configuration, constraints::Constraints,
    minigame::MINIGAME_COUNT, process::LimitedProcess,
};

/// Literal line an agent must answer the handshake with.
pub const HANDSHAKE_REPLY: &str = "INITIALIZED";

/// Something that picks one [`Action`] per tick from the lines describing the match.
///
/// Implemented by [`AgentChannel`] for external processes. In-process implementations are
/// handy to drive a match without spawning anything.
pub trait Decider: Send {
    /// Answer one query.
    ///
    /// # Errors
    /// Any error permanently removes the decider from the match.
    fn query(&mut self, lines: &[String]) -> anyhow::Result<Action>;
}

/// Connection to one running agent. The process is killed when the channel is dropped.
#[derive(Debug)]
pub struct AgentChannel {
    slot: usize,
    population_index: usize,
    batches: Sender<Vec<String>>,
    written: Receiver<io::Result<()>>,
    replies: Receiver<io::Result<String>>,
    action_timeout: Option<Duration>,
    // dropped last
    process: LimitedProcess,
}

impl AgentChannel {
    /// Launch `agent` for in-match `slot` and perform the handshake.
    ///
    /// The agent runs in its own cgroup when a RAM limit is set. If the cgroup cannot be created
    /// and `config` allows it, the agent runs as a plain process instead.
    #[instrument(skip_all, fields(agent = %agent, slot = slot))]
    pub fn init(
        agent: &Agent,
        slot: usize,
        constraints: &Constraints,
        config: Configuration,
    ) -> anyhow::Result<AgentChannel> {
        let mut process = launch(agent, constraints, config)?;

        let stdin = process.take_stdin().context("agent stdin is not piped")?;
        let stdout = process.take_stdout().context("agent stdout is not piped")?;
        let (batches, written) = spawn_writer(stdin, slot)?;
        let replies = spawn_reader(stdout, slot)?;

        let mut channel = AgentChannel {
            slot,
            population_index: agent.population_index,
            batches,
            written,
            replies,
            action_timeout: constraints.action_time,
            process,
        };

        let header = [
            slot.to_string(),
            MINIGAME_COUNT.to_string(),
            agent.genes_line(),
        ];
        let reply = channel
            .exchange(header.to_vec(), constraints.init_time)
            .context("handshake failed")?;
        if reply != HANDSHAKE_REPLY {
            bail!("invalid handshake reply '{reply}'");
        }
        debug!(contained = channel.process.is_contained(), "agent initialized");
        Ok(channel)
    }

    /// In-match slot of this agent.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Population index of this agent.
    pub fn population_index(&self) -> usize {
        self.population_index
    }

    /// Write `lines`, then read one reply line. `timeout` bounds both steps together.
    fn exchange(&self, lines: Vec<String>, timeout: Option<Duration>) -> anyhow::Result<String> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let limit = timeout.unwrap_or_default();

        self.batches
            .send(lines)
            .map_err(|_| anyhow!("broken pipe"))?;
        wait(&self.written, deadline)
            .map_err(|e| match e {
                RecvTimeoutError::Timeout => anyhow!("agent did not read its input within {limit:?}"),
                RecvTimeoutError::Disconnected => anyhow!("broken pipe"),
            })?
            .context("broken pipe")?;

        let line = wait(&self.replies, deadline)
            .map_err(|e| match e {
                RecvTimeoutError::Timeout => anyhow!("no reply within {limit:?}"),
                RecvTimeoutError::Disconnected => anyhow!("agent closed its output"),
            })?
            .context("could not read agent output")?;
        Ok(line.trim().to_string())
    }
}

impl Decider for AgentChannel {
    fn query(&mut self, lines: &[String]) -> anyhow::Result<Action> {
        let reply = self.exchange(lines.to_vec(), self.action_timeout)?;
        trace!(slot = self.slot, %reply);
        reply.parse()
    }
}

fn launch(
    agent: &Agent,
    constraints: &Constraints,
    config: Configuration,
) -> anyhow::Result<LimitedProcess> {
    let Some(max_memory) = constraints.agent_ram else {
        return LimitedProcess::launch_without_container(
            &agent.command,
            &agent.args,
            config.debug_agent_stderr,
        );
    };

    match LimitedProcess::launch(
        &agent.command,
        &agent.args,
        max_memory as i64,
        config.debug_agent_stderr,
    ) {
        Ok(process) => Ok(process),
        Err(e) if config.allow_uncontained => {
            warn!("could not contain agent, running it uncontained: {e:#}");
            LimitedProcess::launch_without_container(
                &agent.command,
                &agent.args,
                config.debug_agent_stderr,
            )
        }
        Err(e) => Err(e),
    }
}

fn wait<T>(receiver: &Receiver<T>, deadline: Option<Instant>) -> Result<T, RecvTimeoutError> {
    match deadline {
        Some(deadline) => receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())),
        None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
    }
}

/// Write every batch sent to the returned sender to `stdin`, acknowledging each flushed batch on
/// the returned receiver. The thread ends on the first write error or once the sender is dropped.
fn spawn_writer(
    stdin: ChildStdin,
    slot: usize,
) -> anyhow::Result<(Sender<Vec<String>>, Receiver<io::Result<()>>)> {
    let (batches, batch_receiver) = mpsc::channel::<Vec<String>>();
    let (ack_sender, acks) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name(format!("agent-writer-{slot}"))
        .spawn(move || {
            let mut stdin = BufWriter::new(stdin);
            for batch in batch_receiver {
                let written = batch
                    .iter()
                    .try_for_each(|line| writeln!(stdin, "{line}"))
                    .and_then(|()| stdin.flush());
                let failed = written.is_err();
                if ack_sender.send(written).is_err() || failed {
                    break;
                }
            }
        })
        .context("could not spawn writer thread")?;
    Ok((batches, acks))
}

/// Lines read ahead of the engine before the reader stops pulling from the agent.
const READ_AHEAD: usize = 16;

/// Forward every line of `stdout` to the returned receiver. The thread ends at end of output or
/// once the receiver is dropped.
fn spawn_reader(stdout: ChildStdout, slot: usize) -> anyhow::Result<Receiver<io::Result<String>>> {
    let (sender, receiver) = mpsc::sync_channel(READ_AHEAD);
    thread::Builder::new()
        .name(format!("agent-reader-{slot}"))
        .spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let failed = line.is_err();
                if sender.send(line).is_err() || failed {
                    break;
                }
            }
        })
        .context("could not spawn reader thread")?;
    Ok(receiver)
}
