pub mod ssh {
    pub const PROGRAM: &str = "ssh";
    pub const DEFAULT_SHELL: &str = "/bin/sh";
    pub const DEFAULT_SHELL_CMD_ARG: &str = "-c";
    pub const IDENTITIES_ONLY: &str = "IdentitiesOnly=yes";
    pub const BATCH_MODE: &str = "BatchMode=yes";
    pub const DISABLE_TTY: &str = "-T";
}

pub mod workspace {
    pub const DEFAULT_BASE_DIR: &str = "/var/tmp/nci/data/projects";
    pub const SEGMENT: &str = "workspace";
    pub const EXISTS_MARKER: &str = "0";
}

pub mod limits {
    pub const LOG_SUBSTRING_LENGTH: usize = 100;
    pub const STDERR_DETAIL_BYTES: usize = 4 * 1024;
}
