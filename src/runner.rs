use std::env;
use std::ffi::{OsStr, OsString};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::settings::Settings;

const WAIT_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Compiling,
    CompileFailed,
    Running,
    Finished(i32),
    /// Killed by [`ProcessRunner::stop`] while compiling or running.
    Stopped,
    Error,
}

impl RunStatus {
    pub fn label(self) -> String {
        match self {
            RunStatus::Compiling => "Compiling".to_string(),
            RunStatus::CompileFailed => "Compilation failed".to_string(),
            RunStatus::Running => "Running".to_string(),
            RunStatus::Finished(code) => format!("Finished ({code})"),
            RunStatus::Stopped => "Stopped".to_string(),
            RunStatus::Error => "Error".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Output(String),
    Status(RunStatus),
    /// The worker is done; a new run may start.
    Finished,
}

/// Everything needed to invoke the compiler, resolved from [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub compiler: PathBuf,
    pub flags: Vec<String>,
    pub include_path: String,
    pub lib_path: String,
}

impl BuildConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let flags = shell_words::split(&settings.flags).map_err(|e| Error::Flags(e.to_string()))?;
        Ok(Self {
            compiler: resolve_compiler(settings, env::var_os("PATH").as_deref()),
            flags,
            include_path: settings.include_path.clone(),
            lib_path: settings.lib_path.clone(),
        })
    }

    /// `<source> -o <exe> [flags...] [-I dir] [-L dir]`
    pub fn make_args(&self, source: &Path, exe: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![source.into(), "-o".into(), exe.into()];
        args.extend(self.flags.iter().map(OsString::from));
        if !self.include_path.is_empty() {
            args.push("-I".into());
            args.push(OsString::from(&self.include_path));
        }
        if !self.lib_path.is_empty() {
            args.push("-L".into());
            args.push(OsString::from(&self.lib_path));
        }
        args
    }
}

/// Compiler binary for `settings`: searched on `path_var` when lookup is on,
/// else `compiler_path/compiler`.
pub fn resolve_compiler(settings: &Settings, path_var: Option<&OsStr>) -> PathBuf {
    if settings.lookup_compiler {
        path_var
            .and_then(|p| search_path(&settings.compiler, p))
            .unwrap_or_else(|| PathBuf::from(&settings.compiler))
    } else {
        Path::new(&settings.compiler_path).join(&settings.compiler)
    }
}

pub fn search_path(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    for dir in env::split_paths(path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
    }
    None
}

type Slot<T> = Arc<Mutex<Option<T>>>;

fn lock<T>(slot: &Mutex<T>) -> io::Result<std::sync::MutexGuard<'_, T>> {
    slot.lock()
        .map_err(|_| io::Error::other("runner lock poisoned"))
}

/// Compiles and runs one source file at a time on a worker thread.
///
/// Output and status changes arrive through [`ProcessRunner::poll`].
pub struct ProcessRunner {
    tx: Sender<RunEvent>,
    rx: Receiver<RunEvent>,
    child: Slot<Child>,
    stdin: Slot<ChildStdin>,
    running: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    line: String,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            child: Arc::new(Mutex::new(None)),
            stdin: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
            line: String::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start building `source`. Returns false if a run is already in progress.
    pub fn start(&mut self, source: PathBuf, config: BuildConfig) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!(source = %source.display(), compiler = %config.compiler.display(), "build and run");
        self.line.clear();
        self.stopped.store(false, Ordering::SeqCst);
        let worker = Worker {
            tx: self.tx.clone(),
            child: Arc::clone(&self.child),
            stdin: Arc::clone(&self.stdin),
            stopped: Arc::clone(&self.stopped),
        };
        let running = Arc::clone(&self.running);
        thread::spawn(move || {
            worker.build_and_run(&source, &config);
            if let Ok(mut stdin) = lock(&worker.stdin) {
                stdin.take();
            }
            running.store(false, Ordering::SeqCst);
            let _ = worker.tx.send(RunEvent::Finished);
        });
        true
    }

    /// Drain pending events without blocking.
    pub fn poll(&self) -> Vec<RunEvent> {
        self.rx.try_iter().collect()
    }

    /// Stop the current run: kill the compiler or program and skip anything
    /// not started yet. Returns false when nothing was running.
    pub fn stop(&mut self) -> Result<bool> {
        if !self.is_running() {
            return Ok(false);
        }
        self.stopped.store(true, Ordering::SeqCst);
        let mut guard = lock(&self.child)?;
        if let Some(child) = guard.as_mut() {
            debug!(pid = child.id(), "kill child");
            match child.kill() {
                // InvalidInput: it already exited.
                Err(err) if err.kind() != io::ErrorKind::InvalidInput => return Err(err.into()),
                _ => {}
            }
        }
        Ok(true)
    }

    /// The stdin line typed so far.
    pub fn pending_input(&self) -> &str {
        &self.line
    }

    pub fn push_char(&mut self, ch: char) {
        self.line.push(ch);
    }

    pub fn pop_char(&mut self) {
        self.line.pop();
    }

    /// Send the pending line plus a newline to the program's stdin.
    ///
    /// Returns the line that was sent; without a running program it is dropped.
    pub fn flush_line(&mut self) -> Result<String> {
        let mut line = std::mem::take(&mut self.line);
        line.push('\n');
        let mut guard = lock(&self.stdin)?;
        if let Some(stdin) = guard.as_mut() {
            stdin.write_all(line.as_bytes())?;
            stdin.flush()?;
        }
        Ok(line)
    }
}

impl Drop for ProcessRunner {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(%err, "failed to stop process on exit");
        }
    }
}

struct Worker {
    tx: Sender<RunEvent>,
    child: Slot<Child>,
    stdin: Slot<ChildStdin>,
    stopped: Arc<AtomicBool>,
}

impl Worker {
    fn send(&self, event: RunEvent) {
        let _ = self.tx.send(event);
    }

    fn was_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn fail(&self, status: RunStatus, headline: &str, err: &dyn std::fmt::Display) {
        warn!(%err, "{headline}");
        self.send(RunEvent::Output(headline.to_string()));
        self.send(RunEvent::Output(err.to_string()));
        self.send(RunEvent::Status(status));
    }

    fn build_and_run(&self, source: &Path, config: &BuildConfig) {
        let build_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(err) => return self.fail(RunStatus::Error, "Could not create build directory", &err),
        };
        let exe = build_dir
            .path()
            .join(if cfg!(windows) { "program.exe" } else { "program" });

        self.send(RunEvent::Status(RunStatus::Compiling));
        let mut compile = Command::new(&config.compiler);
        compile
            .args(config.make_args(source, &exe))
            .stdin(Stdio::null());
        let status = match self.spawn_and_stream(compile, &config.compiler, false) {
            Ok(status) => status,
            Err(err) => return self.fail(RunStatus::CompileFailed, "Compilation failed", &err),
        };
        // Also covers a stop that lands between compiling and running.
        if self.was_stopped() {
            return self.send(RunEvent::Status(RunStatus::Stopped));
        }
        if !status.success() {
            let code = status.code().unwrap_or(-1);
            return self.fail(
                RunStatus::CompileFailed,
                "Compilation failed",
                &format!("compiler exited with code {code}"),
            );
        }

        self.send(RunEvent::Status(RunStatus::Running));
        let run = Command::new(&exe);
        match self.spawn_and_stream(run, &exe, true) {
            Ok(_) if self.was_stopped() => self.send(RunEvent::Status(RunStatus::Stopped)),
            Ok(status) => {
                let code = status.code().unwrap_or(-1);
                self.send(RunEvent::Output(format!("Process exited with code {code}")));
                self.send(RunEvent::Status(RunStatus::Finished(code)));
            }
            Err(err) => self.fail(RunStatus::Error, "Failed to run program", &err),
        }
        drop(build_dir);
    }

    /// Spawn `cmd` with piped output, stream its lines and wait for it.
    fn spawn_and_stream(
        &self,
        mut cmd: Command,
        program: &Path,
        interactive: bool,
    ) -> Result<ExitStatus> {
        if interactive {
            cmd.stdin(Stdio::piped());
        }
        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: program.to_path_buf(),
                source,
            })?;
        debug!(pid = child.id(), program = %program.display(), "spawned");
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        if let Some(stdin) = child.stdin.take() {
            *lock(&self.stdin)? = Some(stdin);
        }
        *lock(&self.child)? = Some(child);

        let err_reader = stderr.map(|err| {
            let tx = self.tx.clone();
            thread::spawn(move || forward_lines(err, &tx))
        });
        if let Some(out) = stdout {
            forward_lines(out, &self.tx);
        }
        if let Some(handle) = err_reader {
            let _ = handle.join();
        }
        Ok(self.wait_child()?)
    }

    /// Wait for the child in the slot without holding the lock, so `stop` can kill it.
    fn wait_child(&self) -> io::Result<ExitStatus> {
        loop {
            {
                let mut guard = lock(&self.child)?;
                let Some(child) = guard.as_mut() else {
                    return Err(io::Error::other("child process handle missing"));
                };
                if let Some(status) = child.try_wait()? {
                    guard.take();
                    return Ok(status);
                }
            }
            thread::sleep(WAIT_POLL);
        }
    }
}

fn forward_lines<R: Read>(reader: R, tx: &Sender<RunEvent>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']).to_string();
                if tx.send(RunEvent::Output(line)).is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Instant;

    fn config(flags: &[&str], include: &str, lib: &str) -> BuildConfig {
        BuildConfig {
            compiler: PathBuf::from("g++"),
            flags: flags.iter().map(|s| s.to_string()).collect(),
            include_path: include.to_string(),
            lib_path: lib.to_string(),
        }
    }

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn args_without_extras() {
        let args = config(&[], "", "").make_args(Path::new("main.cpp"), Path::new("/tmp/x"));
        assert_eq!(args, os_args(&["main.cpp", "-o", "/tmp/x"]));
    }

    #[test]
    fn args_with_flags_and_paths() {
        let args = config(&["-Wall", "-O2"], "inc", "lib")
            .make_args(Path::new("a.cpp"), Path::new("a"));
        assert_eq!(
            args,
            os_args(&["a.cpp", "-o", "a", "-Wall", "-O2", "-I", "inc", "-L", "lib"])
        );
    }

    #[test]
    fn flags_split_like_a_shell() {
        let settings = Settings {
            flags: r#"-DNAME="two words" -std=c++17"#.to_string(),
            ..Settings::default()
        };
        let cfg = BuildConfig::from_settings(&settings).unwrap();
        assert_eq!(cfg.flags, vec!["-DNAME=two words", "-std=c++17"]);

        let bad = Settings {
            flags: "\"unterminated".to_string(),
            ..Settings::default()
        };
        assert!(matches!(BuildConfig::from_settings(&bad), Err(Error::Flags(_))));
    }

    #[test]
    fn compiler_found_on_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("g++"), "").unwrap();
        let path_var = env::join_paths([Path::new("/nonexistent"), dir.path()]).unwrap();
        let settings = Settings::default();
        assert_eq!(
            resolve_compiler(&settings, Some(path_var.as_os_str())),
            dir.path().join("g++")
        );
    }

    #[test]
    fn compiler_falls_back_to_bare_name() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            compiler: "clang++".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            resolve_compiler(&settings, Some(dir.path().as_os_str())),
            PathBuf::from("clang++")
        );
    }

    #[test]
    fn compiler_from_configured_dir() {
        let settings = Settings {
            lookup_compiler: false,
            compiler_path: "/opt/gcc/bin".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            resolve_compiler(&settings, None),
            PathBuf::from("/opt/gcc/bin/g++")
        );
    }

    #[test]
    fn stdin_line_is_buffered_until_flush() {
        let mut runner = ProcessRunner::new();
        runner.push_char('4');
        runner.push_char('x');
        runner.pop_char();
        runner.push_char('\t');
        runner.push_char('2');
        assert_eq!(runner.pending_input(), "4\t2");
        assert_eq!(runner.flush_line().unwrap(), "4\t2\n");
        assert_eq!(runner.pending_input(), "");
        assert!(!runner.stop().unwrap());
    }

    fn collect_until_finished(runner: &ProcessRunner) -> Vec<RunEvent> {
        let deadline = Instant::now() + Duration::from_secs(20);
        let mut events = Vec::new();
        while Instant::now() < deadline {
            events.extend(runner.poll());
            if events.last() == Some(&RunEvent::Finished) {
                return events;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("runner did not finish: {events:?}");
    }

    #[cfg(unix)]
    #[test]
    fn builds_and_runs_with_a_fake_compiler() {
        // `sh script -o exe` writes a program to exe that echoes and exits 3.
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("build.sh");
        fs::write(
            &script,
            "printf '#!/bin/sh\\necho hello\\nexit 3\\n' > \"$2\"\nchmod +x \"$2\"\necho built\n",
        )
        .unwrap();
        let cfg = BuildConfig {
            compiler: PathBuf::from("sh"),
            flags: Vec::new(),
            include_path: String::new(),
            lib_path: String::new(),
        };
        let mut runner = ProcessRunner::new();
        assert!(runner.start(script, cfg.clone()));
        assert!(!runner.start(PathBuf::from("other.cpp"), cfg));
        let events = collect_until_finished(&runner);
        assert!(!runner.is_running());
        assert!(events.contains(&RunEvent::Status(RunStatus::Compiling)));
        assert!(events.contains(&RunEvent::Output("built".to_string())));
        assert!(events.contains(&RunEvent::Status(RunStatus::Running)));
        assert!(events.contains(&RunEvent::Output("hello".to_string())));
        assert!(events.contains(&RunEvent::Output("Process exited with code 3".to_string())));
        assert!(events.contains(&RunEvent::Status(RunStatus::Finished(3))));
    }

    #[cfg(unix)]
    #[test]
    fn failing_compiler_reports_compilation_failed() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("broken.sh");
        fs::write(&script, "echo 'error: expected ;' >&2\nexit 1\n").unwrap();
        let cfg = BuildConfig {
            compiler: PathBuf::from("sh"),
            flags: Vec::new(),
            include_path: String::new(),
            lib_path: String::new(),
        };
        let mut runner = ProcessRunner::new();
        assert!(runner.start(script, cfg));
        let events = collect_until_finished(&runner);
        assert!(events.contains(&RunEvent::Output("error: expected ;".to_string())));
        assert!(events.contains(&RunEvent::Output("Compilation failed".to_string())));
        assert!(events.contains(&RunEvent::Status(RunStatus::CompileFailed)));
        assert!(!events.contains(&RunEvent::Status(RunStatus::Running)));
    }

    #[cfg(unix)]
    #[test]
    fn stop_during_compile_reports_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow.sh");
        fs::write(&script, "echo compiling\nexec sleep 30\n").unwrap();
        let cfg = BuildConfig {
            compiler: PathBuf::from("sh"),
            flags: Vec::new(),
            include_path: String::new(),
            lib_path: String::new(),
        };
        let mut runner = ProcessRunner::new();
        assert!(runner.start(script, cfg));
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut events = Vec::new();
        while !events.contains(&RunEvent::Output("compiling".to_string())) {
            assert!(Instant::now() < deadline, "compiler never started: {events:?}");
            events.extend(runner.poll());
            thread::sleep(Duration::from_millis(10));
        }
        assert!(runner.stop().unwrap());
        events.extend(collect_until_finished(&runner));
        assert!(events.contains(&RunEvent::Status(RunStatus::Stopped)));
        assert!(!events.contains(&RunEvent::Status(RunStatus::CompileFailed)));
        assert!(!events.contains(&RunEvent::Output("Compilation failed".to_string())));
        assert!(!events.contains(&RunEvent::Status(RunStatus::Running)));
        assert!(!runner.stop().unwrap());
    }

    #[test]
    fn missing_compiler_reports_spawn_error() {
        let cfg = BuildConfig {
            compiler: PathBuf::from("/definitely/not/a/compiler"),
            flags: Vec::new(),
            include_path: String::new(),
            lib_path: String::new(),
        };
        let mut runner = ProcessRunner::new();
        assert!(runner.start(PathBuf::from("main.cpp"), cfg));
        let events = collect_until_finished(&runner);
        assert!(events.contains(&RunEvent::Status(RunStatus::CompileFailed)));
    }
}
