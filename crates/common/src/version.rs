use std::fmt;

use serde::Serialize;

/// Compile-time description of the running binary
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub repo_version: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub build_target: Option<&'static str>,
    pub build_host: Option<&'static str>,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version:   {}", self.repo_version)?;
        writeln!(f, "profile:   {}", self.build_profile)?;
        writeln!(f, "features:  {}", self.build_features)?;
        writeln!(f, "built at:  {}", self.build_timestamp)?;
        write!(f, "rustc:     {}", self.rust_version)?;
        if let Some(target) = self.build_target {
            write!(f, "\ntarget:    {}", target)?;
        }
        if let Some(host) = self.build_host {
            write!(f, "\nhost:      {}", host)?;
        }
        Ok(())
    }
}

/// Assemble a [`BuildInfo`] from the env vars exported by the calling
/// crate's build script
#[macro_export]
macro_rules! build_info {
    () => {
        $crate::version::BuildInfo {
            build_profile: env!("BUILD_PROFILE"),
            build_features: env!("BUILD_FEATURES"),
            repo_version: env!("REPO_VERSION"),
            build_timestamp: env!("BUILD_TIMESTAMP"),
            rust_version: env!("RUST_VERSION"),
            build_target: option_env!("BUILD_TARGET"),
            build_host: option_env!("BUILD_HOST"),
        }
    };
}
