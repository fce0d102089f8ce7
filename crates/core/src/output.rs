//! Output sinks handed to processors while a graph is executed.
//!
//! Processors never write to the process streams directly. They write
//! through an [`Output`], which lets tests capture text, lets deferred
//! completion silence sub-graphs, and lets a sink ask the engine to stop
//! walking after the current processor returns.

use std::io::Write;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::error::Error;

pub trait Output {
    /// Writes `text` as a line to standard output.
    fn stdout(&mut self, text: &str);

    /// Writes `text` as a line to standard error.
    fn stderr(&mut self, text: &str);

    /// Prints the error to standard error and hands it back.
    fn err(&mut self, err: Error) -> Error {
        self.stderr(&err.to_string());
        err
    }

    /// Requests that the engine stop walking further nodes once the current
    /// processor call returns. The engine returns `err`.
    fn terminate(&mut self, err: Error);

    fn take_termination(&mut self) -> Option<Error>;
}

/// Captures everything written, line by line.
#[derive(Debug, Default)]
pub struct BufferedOutput {
    stdout: Vec<String>,
    stderr: Vec<String>,
    terminated: Option<Error>,
}

impl BufferedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout_lines(&self) -> &[String] {
        &self.stdout
    }

    pub fn stderr_lines(&self) -> &[String] {
        &self.stderr
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

impl Output for BufferedOutput {
    fn stdout(&mut self, text: &str) {
        self.stdout.push(text.to_string());
    }

    fn stderr(&mut self, text: &str) {
        self.stderr.push(text.to_string());
    }

    fn terminate(&mut self, err: Error) {
        self.terminated = Some(err);
    }

    fn take_termination(&mut self) -> Option<Error> {
        self.terminated.take()
    }
}

/// Drops every write.
#[derive(Debug, Default)]
pub struct DiscardOutput {
    terminated: Option<Error>,
}

impl Output for DiscardOutput {
    fn stdout(&mut self, _text: &str) {}

    fn stderr(&mut self, _text: &str) {}

    fn terminate(&mut self, err: Error) {
        self.terminated = Some(err);
    }

    fn take_termination(&mut self) -> Option<Error> {
        self.terminated.take()
    }
}

struct Stream {
    sender: Sender<String>,
    handle: JoinHandle<()>,
}

impl Stream {
    fn spawn<W: Write + Send + 'static>(name: &'static str, mut writer: W) -> Self {
        let (sender, receiver) = mpsc::channel::<String>();
        let handle = thread::spawn(move || {
            for line in receiver {
                if let Err(e) = writeln!(writer, "{line}") {
                    warn!("Failed to forward {name} line: {e}");
                }
            }
            if let Err(e) = writer.flush() {
                warn!("Failed to flush {name}: {e}");
            }
            debug!("{name} forwarding thread drained");
        });

        Self { sender, handle }
    }

    fn send(&self, text: &str) {
        if self.sender.send(text.to_string()).is_err() {
            warn!("Output forwarding thread exited early, dropping line");
        }
    }

    fn close(self) {
        drop(self.sender);
        if self.handle.join().is_err() {
            warn!("Output forwarding thread panicked");
        }
    }
}

/// Serializes writes onto real streams through one forwarding thread per
/// stream, so processors never need to lock the underlying writers.
///
/// [`ForwardingOutput::close`] (or dropping the sink) blocks until every
/// queued line has been written and flushed.
pub struct ForwardingOutput {
    stdout: Option<Stream>,
    stderr: Option<Stream>,
    terminated: Option<Error>,
}

impl ForwardingOutput {
    pub fn new<O, E>(stdout: O, stderr: E) -> Self
    where
        O: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        Self {
            stdout: Some(Stream::spawn("stdout", stdout)),
            stderr: Some(Stream::spawn("stderr", stderr)),
            terminated: None,
        }
    }

    /// A sink forwarding to the process's own stdout and stderr.
    pub fn std() -> Self {
        Self::new(std::io::stdout(), std::io::stderr())
    }

    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stream) = self.stdout.take() {
            stream.close();
        }
        if let Some(stream) = self.stderr.take() {
            stream.close();
        }
    }
}

impl Drop for ForwardingOutput {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Output for ForwardingOutput {
    fn stdout(&mut self, text: &str) {
        if let Some(stream) = &self.stdout {
            stream.send(text);
        }
    }

    fn stderr(&mut self, text: &str) {
        if let Some(stream) = &self.stderr {
            stream.send(text);
        }
    }

    fn terminate(&mut self, err: Error) {
        self.terminated = Some(err);
    }

    fn take_termination(&mut self) -> Option<Error> {
        self.terminated.take()
    }
}
