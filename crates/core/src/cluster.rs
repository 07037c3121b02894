// Cluster introspection
//
// Best-effort facts about the cluster hosting the endpoints. Every lookup is
// optional: a failing or slow command leaves its field empty and never
// aborts a run.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tracing::debug;

/// Default bound on each kubectl call
pub const DEFAULT_KUBECTL_TIMEOUT: Duration = Duration::from_secs(5);

/// What could be learned about the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterFacts {
    pub context: Option<String>,
    pub node_count: Option<usize>,
}

impl fmt::Display for ClusterFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "context: {context}")?,
            None => write!(f, "context: unavailable")?,
        }
        match self.node_count {
            Some(nodes) => write!(f, ", nodes: {nodes}"),
            None => write!(f, ", nodes: unavailable"),
        }
    }
}

/// Source of cluster facts
#[async_trait]
pub trait ClusterIntrospector: Send + Sync {
    async fn facts(&self) -> ClusterFacts;
}

/// Reads cluster facts through the kubectl command line
#[derive(Debug, Clone)]
pub struct KubectlIntrospector {
    program: String,
    timeout: Duration,
}

impl Default for KubectlIntrospector {
    fn default() -> Self {
        Self {
            program: "kubectl".to_string(),
            timeout: DEFAULT_KUBECTL_TIMEOUT,
        }
    }
}

impl KubectlIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable (e.g. a wrapper script)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the program with `args`; stdout on success, None otherwise
    async fn run(&self, args: &[&str]) -> Option<String> {
        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(output)) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Ok(output)) => {
                debug!(?args, status = %output.status, "kubectl exited with failure");
                None
            }
            Ok(Err(e)) => {
                debug!(?args, error = %e, "kubectl could not be started");
                None
            }
            Err(_) => {
                debug!(?args, "kubectl timed out");
                None
            }
        }
    }
}

#[async_trait]
impl ClusterIntrospector for KubectlIntrospector {
    async fn facts(&self) -> ClusterFacts {
        let context = self
            .run(&["config", "current-context"])
            .await
            .map(|out| out.trim().to_string())
            .filter(|ctx| !ctx.is_empty());

        let node_count = self
            .run(&["get", "nodes", "--no-headers"])
            .await
            .map(|out| out.lines().filter(|l| !l.trim().is_empty()).count());

        ClusterFacts {
            context,
            node_count,
        }
    }
}
