use std::fmt;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Version;

/// Build metadata baked in by build.rs
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub repo_version: &'static str,
    pub build_profile: &'static str,
    pub rust_version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            repo_version: env!("REPO_VERSION"),
            build_profile: env!("BUILD_PROFILE"),
            rust_version: env!("RUST_VERSION"),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "packwire {} ({}, {} build, {})",
            self.version, self.repo_version, self.build_profile, self.rust_version
        )
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Version {
    type Error = std::convert::Infallible;
    type Output = BuildInfo;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let build = BuildInfo::current();
        tracing::debug!(
            repo_version = build.repo_version,
            build_profile = build.build_profile,
            "reporting build info"
        );
        Ok(build)
    }
}
