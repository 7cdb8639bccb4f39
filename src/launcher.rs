use std::time::Duration;

use thiserror::Error;

use crate::entry::Entry;
use crate::system::{CommandSpec, RunOutcome, System, ToolAvailability};

/// Wait for `kitten @ launch` before falling back to taking over this terminal.
pub const REMOTE_LAUNCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Wait for `@ set-colors`, which can be slow with many open windows.
pub const SET_COLORS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LaunchError {
    #[error("could not run {0} (not in PATH)")]
    ToolNotFound(String),
    #[error("timed out waiting for {program} (try again or increase timeout)")]
    Timeout { program: String },
    #[error("{message}")]
    NonZeroExit { program: String, message: String },
    #[error("could not run {program}: {detail}")]
    Spawn { program: String, detail: String },
}

/// How a successful launch left things.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Launched {
    /// The command runs in a new kitty tab.
    NewTab,
    /// The color scheme was applied to the running kitty.
    Applied,
}

/// Turns a selected entry into an external process.
pub trait Launch {
    fn launch(&self, entry: &Entry) -> Result<Launched, LaunchError>;

    /// Notice shown after a successful launch.
    fn confirmation(&self, entry: &Entry) -> String;
}

enum Strategy {
    /// Run to completion within `limit`; exit 0 means `on_success`.
    Bounded {
        cmd: CommandSpec,
        limit: Duration,
        on_success: Launched,
    },
    /// Hand this terminal over to `cmd`.
    Replace(CommandSpec),
}

impl Strategy {
    fn command(&self) -> &CommandSpec {
        match self {
            Strategy::Bounded { cmd, .. } | Strategy::Replace(cmd) => cmd,
        }
    }
}

/// Tries each strategy in order. A missing tool never masks a real failure
/// reported by an earlier or later strategy.
fn run_chain<S: System>(system: &S, chain: Vec<Strategy>) -> Result<Launched, LaunchError> {
    let mut failure: Option<LaunchError> = None;
    let mut missing: Vec<String> = Vec::new();

    for strategy in chain {
        let cmd = strategy.command().clone();
        match system.probe(&cmd.program) {
            ToolAvailability::Available(_) => {}
            ToolAvailability::NotFound => {
                log::debug!("{} not found, skipping `{cmd}`", cmd.program);
                push_missing(&mut missing, &cmd.program);
                continue;
            }
            ToolAvailability::Error(detail) => {
                log::debug!("probing {} failed: {detail}", cmd.program);
                failure = Some(LaunchError::Spawn {
                    program: cmd.program,
                    detail,
                });
                continue;
            }
        }

        match strategy {
            Strategy::Bounded {
                limit, on_success, ..
            } => match system.run_bounded(&cmd, limit) {
                RunOutcome::Exited { code: Some(0), .. } => {
                    log::info!("`{cmd}` succeeded");
                    return Ok(on_success);
                }
                RunOutcome::Exited {
                    code,
                    stdout,
                    stderr,
                } => {
                    let message = captured_message(code, &stdout, &stderr);
                    log::debug!("`{cmd}` failed: {message}");
                    failure = Some(LaunchError::NonZeroExit {
                        program: cmd.program,
                        message,
                    });
                }
                RunOutcome::TimedOut => {
                    log::debug!("`{cmd}` timed out after {limit:?}");
                    failure = Some(LaunchError::Timeout {
                        program: cmd.program,
                    });
                }
                RunOutcome::NotFound => push_missing(&mut missing, &cmd.program),
                RunOutcome::Failed(detail) => {
                    failure = Some(LaunchError::Spawn {
                        program: cmd.program,
                        detail,
                    });
                }
            },
            Strategy::Replace(_) => {
                log::info!("replacing process with `{cmd}`");
                let err = system.replace_process(&cmd);
                if err.kind() == std::io::ErrorKind::NotFound {
                    push_missing(&mut missing, &cmd.program);
                } else {
                    failure = Some(LaunchError::Spawn {
                        program: cmd.program,
                        detail: err.to_string(),
                    });
                }
            }
        }
    }

    Err(failure.unwrap_or_else(|| LaunchError::ToolNotFound(missing.join(" or "))))
}

fn push_missing(missing: &mut Vec<String>, program: &str) {
    if !missing.iter().any(|p| p == program) {
        missing.push(program.to_string());
    }
}

fn captured_message(code: Option<i32>, stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    let stdout = stdout.trim();
    if !stderr.is_empty() {
        stderr.to_string()
    } else if !stdout.is_empty() {
        stdout.to_string()
    } else {
        match code {
            Some(code) => format!("exit {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

fn new_tab(inner: &CommandSpec) -> CommandSpec {
    CommandSpec::new("kitten")
        .args(["@", "launch", "--type=tab", "--cwd", "current"])
        .args(inner.argv())
}

/// Which ssh client runs the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SshClient {
    /// `kitten ssh`, which can switch the tab's color scheme.
    Kitten,
    /// Plain `ssh`.
    Plain,
}

/// Connects to the selected host.
pub struct SshLauncher<S> {
    system: S,
    client: SshClient,
}

impl<S: System> SshLauncher<S> {
    pub fn new(system: S, client: SshClient) -> Self {
        Self { system, client }
    }

    fn chain(&self, entry: &Entry) -> Vec<Strategy> {
        let plain = CommandSpec::new("ssh").arg(&entry.target_key);
        match self.client {
            SshClient::Kitten => {
                let mut kitten = CommandSpec::new("kitten").arg("ssh");
                if let Some(theme) = &entry.metadata {
                    kitten = kitten.arg("--kitten").arg(format!("color_scheme={theme}"));
                }
                let kitten = kitten.arg(&entry.target_key);
                vec![
                    Strategy::Bounded {
                        cmd: new_tab(&kitten),
                        limit: REMOTE_LAUNCH_TIMEOUT,
                        on_success: Launched::NewTab,
                    },
                    Strategy::Replace(kitten),
                    Strategy::Replace(plain),
                ]
            }
            SshClient::Plain => vec![
                Strategy::Bounded {
                    cmd: new_tab(&plain),
                    limit: REMOTE_LAUNCH_TIMEOUT,
                    on_success: Launched::NewTab,
                },
                Strategy::Replace(plain),
            ],
        }
    }
}

impl<S: System> Launch for SshLauncher<S> {
    fn launch(&self, entry: &Entry) -> Result<Launched, LaunchError> {
        run_chain(&self.system, self.chain(entry))
    }

    fn confirmation(&self, entry: &Entry) -> String {
        format!("Connecting to {}…", entry.display_label)
    }
}

/// Applies the selected theme file to the running kitty.
pub struct ThemeLauncher<S> {
    system: S,
}

impl<S: System> ThemeLauncher<S> {
    pub fn new(system: S) -> Self {
        Self { system }
    }
}

impl<S: System> Launch for ThemeLauncher<S> {
    fn launch(&self, entry: &Entry) -> Result<Launched, LaunchError> {
        let chain = ["kitten", "kitty"]
            .into_iter()
            .map(|program| Strategy::Bounded {
                cmd: CommandSpec::new(program)
                    .args(["@", "set-colors", "-a"])
                    .arg(&entry.target_key),
                limit: SET_COLORS_TIMEOUT,
                on_success: Launched::Applied,
            })
            .collect();
        run_chain(&self.system, chain)
    }

    fn confirmation(&self, entry: &Entry) -> String {
        format!("Applied: {}", entry.display_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;

    #[derive(Debug, PartialEq)]
    enum Call {
        Run(Vec<String>),
        Replace(Vec<String>),
    }

    /// Programs not listed in `installed` are missing; runs answer from
    /// `outcomes` keyed by program, defaulting to exit 0.
    #[derive(Default)]
    struct FakeSystem {
        installed: Vec<&'static str>,
        outcomes: HashMap<&'static str, RunOutcome>,
        calls: RefCell<Vec<Call>>,
    }

    impl FakeSystem {
        fn with(installed: &[&'static str]) -> Self {
            Self {
                installed: installed.to_vec(),
                ..Default::default()
            }
        }

        fn outcome(mut self, program: &'static str, outcome: RunOutcome) -> Self {
            self.outcomes.insert(program, outcome);
            self
        }
    }

    impl System for &FakeSystem {
        fn probe(&self, program: &str) -> ToolAvailability {
            if self.installed.contains(&program) {
                ToolAvailability::Available(PathBuf::from("/usr/bin").join(program))
            } else {
                ToolAvailability::NotFound
            }
        }

        fn run_bounded(&self, cmd: &CommandSpec, _limit: Duration) -> RunOutcome {
            self.calls.borrow_mut().push(Call::Run(cmd.argv()));
            self.outcomes
                .get(cmd.program.as_str())
                .cloned()
                .unwrap_or(RunOutcome::Exited {
                    code: Some(0),
                    stdout: String::new(),
                    stderr: String::new(),
                })
        }

        fn replace_process(&self, cmd: &CommandSpec) -> io::Error {
            self.calls.borrow_mut().push(Call::Replace(cmd.argv()));
            io::Error::new(io::ErrorKind::PermissionDenied, "exec refused")
        }
    }

    fn argv(s: &str) -> Vec<String> {
        s.split(' ').map(String::from).collect()
    }

    fn host(theme: Option<&str>) -> Entry {
        Entry::new("root@alpha", "alpha", theme.map(String::from))
    }

    fn exit(code: i32, stderr: &str) -> RunOutcome {
        RunOutcome::Exited {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn kitten_new_tab_carries_color_scheme() {
        let system = FakeSystem::with(&["kitten", "ssh"]);
        let launcher = SshLauncher::new(&system, SshClient::Kitten);

        assert_eq!(launcher.launch(&host(Some("dracula"))), Ok(Launched::NewTab));
        assert_eq!(
            *system.calls.borrow(),
            vec![Call::Run(argv(
                "kitten @ launch --type=tab --cwd current kitten ssh --kitten color_scheme=dracula alpha"
            ))]
        );
    }

    #[test]
    fn timed_out_tab_falls_back_to_exec() {
        let system = FakeSystem::with(&["kitten", "ssh"]).outcome("kitten", RunOutcome::TimedOut);
        let launcher = SshLauncher::new(&system, SshClient::Kitten);

        assert!(launcher.launch(&host(None)).is_err());
        assert_eq!(
            *system.calls.borrow(),
            vec![
                Call::Run(argv("kitten @ launch --type=tab --cwd current kitten ssh alpha")),
                Call::Replace(argv("kitten ssh alpha")),
                Call::Replace(argv("ssh alpha")),
            ]
        );
    }

    #[test]
    fn missing_kitten_goes_straight_to_ssh() {
        let system = FakeSystem::with(&["ssh"]);
        let launcher = SshLauncher::new(&system, SshClient::Kitten);

        let err = launcher.launch(&host(Some("nord"))).unwrap_err();
        assert_eq!(*system.calls.borrow(), vec![Call::Replace(argv("ssh alpha"))]);
        assert!(matches!(err, LaunchError::Spawn { ref program, .. } if program == "ssh"));
    }

    #[test]
    fn plain_client_uses_ssh_in_tab() {
        let system = FakeSystem::with(&["kitten", "ssh"]).outcome("kitten", exit(1, "not in kitty"));
        let launcher = SshLauncher::new(&system, SshClient::Plain);

        launcher.launch(&host(Some("nord"))).unwrap_err();
        assert_eq!(
            *system.calls.borrow(),
            vec![
                Call::Run(argv("kitten @ launch --type=tab --cwd current ssh alpha")),
                Call::Replace(argv("ssh alpha")),
            ]
        );
    }

    #[test]
    fn nothing_installed_reports_missing_tools() {
        let system = FakeSystem::with(&[]);
        let launcher = SshLauncher::new(&system, SshClient::Kitten);

        let err = launcher.launch(&host(None)).unwrap_err();
        assert_eq!(err, LaunchError::ToolNotFound("kitten or ssh".into()));
        assert_eq!(err.to_string(), "could not run kitten or ssh (not in PATH)");
        assert!(system.calls.borrow().is_empty());
    }

    fn theme() -> Entry {
        Entry::new("themes/Nord", "/home/u/.config/kitty/themes/Nord.conf", None)
    }

    #[test]
    fn theme_success_stops_after_first_program() {
        let system = FakeSystem::with(&["kitten", "kitty"]);
        let launcher = ThemeLauncher::new(&system);

        assert_eq!(launcher.launch(&theme()), Ok(Launched::Applied));
        assert_eq!(
            *system.calls.borrow(),
            vec![Call::Run(argv(
                "kitten @ set-colors -a /home/u/.config/kitty/themes/Nord.conf"
            ))]
        );
        assert_eq!(launcher.confirmation(&theme()), "Applied: themes/Nord");
    }

    #[test]
    fn theme_falls_back_to_kitty_when_kitten_missing() {
        let system = FakeSystem::with(&["kitty"]);
        let launcher = ThemeLauncher::new(&system);

        assert_eq!(launcher.launch(&theme()), Ok(Launched::Applied));
        assert_eq!(system.calls.borrow().len(), 1);
    }

    #[test]
    fn theme_reports_last_captured_error() {
        let system = FakeSystem::with(&["kitten", "kitty"])
            .outcome("kitten", exit(1, "kitten: remote control disabled\n"))
            .outcome("kitty", exit(2, "  kitty: no socket  "));
        let launcher = ThemeLauncher::new(&system);

        let err = launcher.launch(&theme()).unwrap_err();
        assert_eq!(err.to_string(), "kitty: no socket");
        assert_eq!(system.calls.borrow().len(), 2);
    }

    #[test]
    fn theme_timeout_is_distinct_and_not_masked_by_missing_tool() {
        let system = FakeSystem::with(&["kitten"]).outcome("kitten", RunOutcome::TimedOut);
        let launcher = ThemeLauncher::new(&system);

        let err = launcher.launch(&theme()).unwrap_err();
        assert_eq!(
            err,
            LaunchError::Timeout {
                program: "kitten".into()
            }
        );
    }

    #[test]
    fn empty_output_falls_back_to_exit_code() {
        assert_eq!(captured_message(Some(3), "", " "), "exit 3");
        assert_eq!(captured_message(Some(1), "out\n", ""), "out");
        assert_eq!(captured_message(None, "", ""), "terminated by signal");
    }
}
