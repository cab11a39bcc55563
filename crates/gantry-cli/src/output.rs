use gantry_common::{
    DeploymentSummary, Environment, ModelSpec, NodeRecord, QueueDepth, QueueDepthSample,
    SwitchOutcome,
};

pub fn print_deployment_summary(summary: &DeploymentSummary) {
    println!("\n=== Gantry Deployment Status ===");

    println!("\n[Deployed Models]");
    if summary.model_stats.is_empty() {
        println!("  (Nothing deployed)");
    } else {
        println!("  {:<30} {:<8}", "Model", "Count");
        for stat in &summary.model_stats {
            println!("  {:<30} {:<8}", stat.model_name, stat.count);
        }
    }

    println!("\n[Nodes]");
    for node in &summary.deployment_statuses {
        println!(
            "  node {} ({}:{})",
            node.node_id, node.node_ip, node.node_port
        );
        for gpu in &node.gpus {
            let deployed = gpu
                .deployed_model
                .as_ref()
                .map(|m| m.model_name.as_str())
                .unwrap_or("-");
            let memory = match (gpu.memory_used_mb, gpu.memory_total_mb) {
                (Some(used), Some(total)) => format!("{used:.0}/{total:.0} MB"),
                _ => "n/a".to_string(),
            };
            println!("    gpu {:<3} {:<30} {:<16}", gpu.gpu_id, deployed, memory);
        }
        let available: Vec<String> = node.available_models().into_iter().collect();
        println!("    available: {}", available.join(", "));
    }
    println!();
}

pub fn print_switch_outcome(outcome: &SwitchOutcome) {
    match outcome {
        SwitchOutcome::Success => println!("✓ Switch acknowledged"),
        SwitchOutcome::Partial { stop_ok, start_ok } => println!(
            "! Partial switch: stop {}, start {}",
            if *stop_ok { "ok" } else { "failed" },
            if *start_ok { "ok" } else { "failed" },
        ),
        SwitchOutcome::Failure => println!("✗ Switch failed"),
    }
}

pub fn print_nodes(nodes: &[NodeRecord]) {
    println!("\n=== Gantry Nodes ===\n");
    if nodes.is_empty() {
        println!("No nodes registered.");
        return;
    }
    println!(
        "{:<6} {:<22} {:<8} {:<10} {:<12}",
        "ID", "Address", "Env", "Status", "GPUs"
    );
    println!("{:-<60}", "");
    for node in nodes {
        let gpus: Vec<String> = node.available_gpu_ids.iter().map(u32::to_string).collect();
        println!(
            "{:<6} {:<22} {:<8} {:<10} {:<12}",
            node.id,
            node.addr(),
            node.environment_id
                .map(|e| e.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format!("{:?}", node.status).to_lowercase(),
            gpus.join(","),
        );
    }
    println!();
}

pub fn print_models(models: &[ModelSpec]) {
    println!("\n=== Gantry Models ===\n");
    if models.is_empty() {
        println!("No models registered.");
        return;
    }
    println!("{:<6} {:<30} {:<8} {:<12}", "ID", "Name", "Env", "Avg Inf (s)");
    println!("{:-<60}", "");
    for model in models {
        println!(
            "{:<6} {:<30} {:<8} {:<12}",
            model.id,
            model.model_name,
            model.environment_id,
            model
                .average_inference_time
                .map(|t| format!("{t:.2}"))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    println!();
}

pub fn print_environments(environments: &[Environment]) {
    println!("\n=== Gantry Environments ===\n");
    for env in environments {
        println!(
            "  {:<6} {:<20} {}",
            env.id,
            env.name,
            env.description.as_deref().unwrap_or("")
        );
    }
    println!();
}

pub fn print_queue_depth(depth: &QueueDepth) {
    println!(
        "queue '{}': {} pending{}",
        depth.model_name,
        depth.length,
        depth
            .consumers
            .map(|c| format!(", {c} consumers"))
            .unwrap_or_default(),
    );
}

pub fn print_queue_history(model: &str, samples: &[QueueDepthSample]) {
    println!("\n=== Queue History: {model} ===\n");
    if samples.is_empty() {
        println!("No samples.");
        return;
    }
    for sample in samples {
        println!("  {}  {}", sample.timestamp.to_rfc3339(), sample.length);
    }
    println!();
}
