// Cluster command - current Kubernetes context and node count

use crate::output::{print_field, OutputFormat};
use anyhow::Result;
use partbench_core::{ClusterIntrospector, KubectlIntrospector};

pub async fn run(output: OutputFormat) -> Result<()> {
    let facts = KubectlIntrospector::new().facts().await;

    if !output.is_text() {
        return output.print_value(&facts);
    }

    print_field("Context", facts.context.as_deref().unwrap_or("unavailable"));
    print_field(
        "Nodes",
        &facts
            .node_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unavailable".to_string()),
    );

    Ok(())
}
