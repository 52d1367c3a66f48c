//! The shared install plan rendered into every carrier prelude.
//!
//! Both renderers walk the same [`InstallPlan`], so the step order, messages,
//! tools, and commands cannot drift between host platforms. The plan holds
//! data only; host-specific control flow lives in [`crate::render`].
//!
//! Messages are echoed by `cmd.exe` with delayed expansion enabled, so none of
//! them may contain `!` or `^`.

use std::fmt;

/// The seven install states, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallStep {
    /// Classify the host operating system.
    DetectEnvironment,
    /// Find a Python interpreter that is recent enough.
    CheckRuntimePrerequisite,
    /// Ensure the platform's bootstrap tool is present.
    CheckOsPrerequisites,
    /// Install the `uv` dependency manager.
    InstallDependencyManager,
    /// Write `.env.example` and `.env`.
    SetupEnvironmentFiles,
    /// Extract the embedded payload and verify its digest.
    ExtractAndVerifyPayload,
    /// Hand over to the extracted payload.
    RunPayload,
}

impl InstallStep {
    /// Every step, in the order the installers run them.
    pub const ALL: [Self; 7] = [
        Self::DetectEnvironment,
        Self::CheckRuntimePrerequisite,
        Self::CheckOsPrerequisites,
        Self::InstallDependencyManager,
        Self::SetupEnvironmentFiles,
        Self::ExtractAndVerifyPayload,
        Self::RunPayload,
    ];

    /// Identifier used for the step's function or label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DetectEnvironment => "detect_environment",
            Self::CheckRuntimePrerequisite => "check_runtime_prerequisite",
            Self::CheckOsPrerequisites => "check_os_prerequisites",
            Self::InstallDependencyManager => "install_dependency_manager",
            Self::SetupEnvironmentFiles => "setup_environment_files",
            Self::ExtractAndVerifyPayload => "extract_and_verify_payload",
            Self::RunPayload => "run_payload",
        }
    }

    /// One-line summary written as a comment above the step.
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::DetectEnvironment => "Detect the host operating system.",
            Self::CheckRuntimePrerequisite => "Require Python 3.8 or newer.",
            Self::CheckOsPrerequisites => "Ensure the platform bootstrap tool is available.",
            Self::InstallDependencyManager => "Install the uv package manager.",
            Self::SetupEnvironmentFiles => "Create .env.example and .env.",
            Self::ExtractAndVerifyPayload => "Extract erasmus.py and verify its SHA-256 digest.",
            Self::RunPayload => "Run the Erasmus setup.",
        }
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operating system family reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// Windows, including MinGW, MSYS, and Cygwin shells.
    Windows,
    /// macOS.
    MacOs,
    /// Linux.
    Linux,
    /// Anything else. Detection does not fail, but later steps do.
    Unknown,
}

impl OsFamily {
    /// Families the installers support, in detection order.
    pub const SUPPORTED: [Self; 3] = [Self::Windows, Self::MacOs, Self::Linux];

    /// Value stored in the installer's `OS` variable.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::MacOs => "macOS",
            Self::Linux => "Linux",
            Self::Unknown => "Unknown",
        }
    }

    /// Lowercase suffix for per-family function names and labels.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Unknown => "unknown",
        }
    }

    /// Substrings of `uname -s` or `ver` output that identify the family.
    ///
    /// Both renderers emit their detection branches from this table.
    #[must_use]
    pub const fn detection_patterns(self) -> &'static [&'static str] {
        match self {
            Self::Windows => &["Windows", "MINGW", "MSYS", "CYGWIN"],
            Self::MacOs => &["Darwin"],
            Self::Linux => &["Linux"],
            Self::Unknown => &[],
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The interpreter the payload needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeRequirement {
    /// Interpreter commands tried in order.
    pub candidates: Vec<&'static str>,
    /// Minimum `(major, minor)` version.
    pub minimum: (u32, u32),
    /// Printed when no candidate satisfies the minimum.
    pub failure_message: &'static str,
    /// Printed after the failure message.
    pub remediation: &'static str,
}

impl RuntimeRequirement {
    /// Python expression that exits 0 when the interpreter is recent enough.
    #[must_use]
    pub fn check_expression(&self) -> String {
        let (major, minor) = self.minimum;
        format!("import sys; sys.exit(0 if sys.version_info >= ({major}, {minor}) else 1)")
    }
}

/// One way to install a missing prerequisite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    /// Tool that must exist for this alternative to be tried, if any.
    pub guard: Option<&'static str>,
    /// Command that installs the prerequisite.
    pub command: &'static str,
}

/// The bootstrap tool a platform needs before `uv` can be installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsPrerequisite {
    /// Family the prerequisite applies to.
    pub family: OsFamily,
    /// Tool that must be discoverable.
    pub tool: &'static str,
    /// Printed before checking.
    pub checking_message: &'static str,
    /// Printed before trying the bootstrap alternatives.
    pub installing_message: Option<&'static str>,
    /// Alternatives tried in order until the tool becomes discoverable.
    pub bootstraps: Vec<Bootstrap>,
    /// Printed when every alternative fails.
    pub failure_message: &'static str,
}

/// The dependency manager that runs the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyManager {
    /// Tool that must be discoverable after installation.
    pub tool: &'static str,
    /// Printed before installation.
    pub installing_message: &'static str,
    /// Install command per supported family.
    pub installs: Vec<(OsFamily, &'static str)>,
    /// Directories added to the POSIX search path after installation.
    pub search_paths: Vec<&'static str>,
    /// Printed when the tool is still missing.
    pub failure_message: &'static str,
    /// Printed once the tool is available.
    pub success_message: &'static str,
}

impl DependencyManager {
    /// Return the install command for `family`, if it is supported.
    #[must_use]
    pub fn install_command(&self, family: OsFamily) -> Option<&'static str> {
        self.installs
            .iter()
            .find(|(candidate, _)| *candidate == family)
            .map(|(_, command)| *command)
    }
}

/// The `.env.example` and `.env` files written next to the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentFiles {
    /// Printed before the files are written.
    pub announcement: &'static str,
    /// Prompt shown before reading the IDE environment.
    pub prompt: &'static str,
    /// Variable that receives the prompted value.
    pub variable: &'static str,
    /// Keys written to both files, in order.
    pub keys: Vec<&'static str>,
    /// Template file with every key empty.
    pub example_file: &'static str,
    /// Live file with the prompted value filled in.
    pub live_file: &'static str,
    /// Printed after both files exist.
    pub success_message: &'static str,
}

/// Extraction and execution of the embedded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadHandoff {
    /// Printed before extraction.
    pub announcement: &'static str,
    /// Printed while extracting.
    pub extracting_message: &'static str,
    /// File name the payload is extracted to.
    pub file_name: &'static str,
    /// Printed when the extracted digest matches.
    pub verified_message: &'static str,
    /// Printed when the extracted digest differs.
    pub mismatch_message: &'static str,
    /// Printed when the installer is not running from a saved file.
    pub unsaved_message: &'static str,
    /// Command prefix that runs the payload.
    pub runner: &'static str,
    /// Flag that passes the prompted IDE environment.
    pub setup_flag: &'static str,
    /// Printed before running the payload.
    pub running_message: &'static str,
    /// Printed when the payload exits non-zero.
    pub failure_message: &'static str,
    /// Printed after a successful run.
    pub success_message: &'static str,
}

impl PayloadHandoff {
    /// The command line that runs the payload with `setup_value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use erasmus_installer::plan::InstallPlan;
    ///
    /// let plan = InstallPlan::erasmus();
    /// assert_eq!(plan.payload.command("$IDE_ENV"), "uv run erasmus.py --setup $IDE_ENV");
    /// ```
    #[must_use]
    pub fn command(&self, setup_value: &str) -> String {
        format!(
            "{} {} {} {setup_value}",
            self.runner, self.file_name, self.setup_flag
        )
    }
}

/// The complete install plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    /// Printed with the detected family.
    pub detected_message: &'static str,
    /// Printed when the host family is not supported.
    pub unsupported_message: &'static str,
    /// Python requirement.
    pub runtime: RuntimeRequirement,
    /// Bootstrap tool per supported family.
    pub prerequisites: Vec<OsPrerequisite>,
    /// The `uv` installation.
    pub dependency_manager: DependencyManager,
    /// Environment file generation.
    pub environment: EnvironmentFiles,
    /// Payload extraction and execution.
    pub payload: PayloadHandoff,
    /// Printed after every step succeeded.
    pub completion_message: &'static str,
}

impl InstallPlan {
    /// The plan for installing Erasmus.
    #[must_use]
    pub fn erasmus() -> Self {
        Self {
            detected_message: "Detected operating system:",
            unsupported_message: "Unsupported operating system:",
            runtime: RuntimeRequirement {
                candidates: vec!["python3", "python"],
                minimum: (3, 8),
                failure_message: "Error: Python 3.8+ is required.",
                remediation: "Please install Python 3.8+ before proceeding.",
            },
            prerequisites: vec![
                OsPrerequisite {
                    family: OsFamily::Windows,
                    tool: "winget",
                    checking_message: "Checking Windows prerequisites...",
                    installing_message: Some("Installing winget..."),
                    bootstraps: vec![Bootstrap {
                        guard: Some("powershell"),
                        command: "powershell -Command \"Add-AppxPackage -RegisterByFamilyName -MainPackage Microsoft.DesktopAppInstaller_8wekyb3d8bbwe\"",
                    }],
                    failure_message: "Failed to install winget. Please install it manually from the Microsoft Store.",
                },
                OsPrerequisite {
                    family: OsFamily::MacOs,
                    tool: "brew",
                    checking_message: "Checking macOS prerequisites...",
                    installing_message: None,
                    bootstraps: Vec::new(),
                    failure_message: "Homebrew is required but not installed. Please install Homebrew first: https://brew.sh",
                },
                OsPrerequisite {
                    family: OsFamily::Linux,
                    tool: "curl",
                    checking_message: "Checking Linux prerequisites...",
                    installing_message: Some("Installing curl..."),
                    bootstraps: vec![
                        Bootstrap {
                            guard: Some("apt-get"),
                            command: "apt-get update && apt-get install -y curl",
                        },
                        Bootstrap {
                            guard: Some("yum"),
                            command: "yum install -y curl",
                        },
                    ],
                    failure_message: "Could not install curl. Please install it manually.",
                },
            ],
            dependency_manager: DependencyManager {
                tool: "uv",
                installing_message: "Installing uv package manager...",
                installs: vec![
                    (OsFamily::Windows, "winget install --id=astral-sh.uv -e"),
                    (OsFamily::MacOs, "brew install uv"),
                    (
                        OsFamily::Linux,
                        "curl -LsSf https://astral.sh/uv/install.sh | sh",
                    ),
                ],
                search_paths: vec!["$HOME/.local/bin", "$HOME/.cargo/bin"],
                failure_message: "Failed to install uv package manager.",
                success_message: "uv is installed.",
            },
            environment: EnvironmentFiles {
                announcement: "Creating environment files...",
                prompt: "Please enter your IDE environment (cursor/windsurf):",
                variable: "IDE_ENV",
                keys: vec!["IDE_ENV", "GIT_TOKEN", "OPENAI_API_KEY"],
                example_file: ".env.example",
                live_file: ".env",
                success_message: "Environment files created successfully",
            },
            payload: PayloadHandoff {
                announcement: "Initializing erasmus...",
                extracting_message: "Extracting erasmus.py...",
                file_name: "erasmus.py",
                verified_message: "SHA256 hash verified:",
                mismatch_message: "Error: SHA256 hash verification failed.",
                unsaved_message: "Error: save the installer to a file and run it with sh, not through a pipe.",
                runner: "uv run",
                setup_flag: "--setup",
                running_message: "Running erasmus setup...",
                failure_message: "Error: erasmus setup failed.",
                success_message: "Erasmus initialized successfully. To run Erasmus: uv run erasmus.py",
            },
            completion_message: "Installation complete. Erasmus has been initialized with your IDE environment:",
        }
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &'static [InstallStep] {
        &InstallStep::ALL
    }

}
