//! Plain-text rendering of reports for terminals

use crate::planner::PlanReport;
use rcp_kernel::scheduler::Wave;
use rcp_kernel::topology::TopologyReport;
use rcp_kernel::types::NodeId;

fn join(ids: &[NodeId]) -> String {
    ids.iter().map(NodeId::as_str).collect::<Vec<_>>().join(", ")
}

/// Render waves, one per line
#[must_use]
pub fn render_waves(waves: &[Wave]) -> String {
    if waves.is_empty() {
        return "no schedulable waves\n".to_string();
    }
    let mut out = String::new();
    for wave in waves {
        out.push_str(&format!(
            "wave {} (depth {}): {}\n",
            wave.index,
            wave.depth,
            join(&wave.nodes)
        ));
    }
    out
}

/// Render structural issues and health metrics
#[must_use]
pub fn render_topology(report: &TopologyReport) -> String {
    let mut out = String::new();
    let health = &report.health;

    out.push_str(&format!(
        "nodes: {}  edges: {}\n",
        health.node_count, health.edge_count
    ));
    out.push_str(&format!(
        "fan-in avg {:.2} max {}  fan-out avg {:.2} max {}\n",
        health.average_fan_in, health.max_fan_in, health.average_fan_out, health.max_fan_out
    ));
    out.push_str(&format!(
        "max depth: {}  cycles: {}\n",
        health.max_depth,
        if health.has_cycles { "yes" } else { "no" }
    ));
    out.push_str(&format!("order: {}\n", join(&report.order)));
    if !report.residual.is_empty() {
        out.push_str(&format!("residual: {}\n", join(&report.residual)));
    }
    if !report.critical_path.nodes.is_empty() {
        out.push_str(&format!(
            "critical path ({}m): {}\n",
            report.critical_path.total_minutes,
            join(&report.critical_path.nodes)
        ));
    }

    if report.issues.is_empty() {
        out.push_str("issues: none\n");
    } else {
        out.push_str(&format!("issues: {}\n", report.issues.len()));
        for issue in &report.issues {
            out.push_str(&format!("  {issue}\n"));
        }
    }
    out
}

/// Render a full plan report
#[must_use]
pub fn render_plan(report: &PlanReport) -> String {
    let mut out = String::new();
    let verdict = if report.passed() { "PASS" } else { "FAIL" };

    out.push_str(&format!(
        "plan {} (tenant {}): {verdict}  risk {:.1}\n\n",
        report.graph.plan_id(),
        report.graph.tenant(),
        report.policy.risk_score
    ));
    out.push_str(&render_topology(&report.topology));
    out.push('\n');
    out.push_str(&render_waves(&report.waves));
    out.push_str(&format!("estimated makespan: {}m\n", report.makespan_minutes));

    out.push_str("\npriorities:\n");
    for id in &report.ranking {
        if let Some(score) = report.priorities.get(id) {
            out.push_str(&format!("  {:>3}  {id}\n", score.score));
        }
    }

    if !report.policy.violations.is_empty() {
        out.push_str("\nviolations:\n");
        for violation in &report.policy.violations {
            out.push_str(&format!("  {violation}\n"));
        }
    }
    let unmet = report.policy.unmet_gates();
    if !unmet.is_empty() {
        let names: Vec<String> = unmet.iter().map(ToString::to_string).collect();
        out.push_str(&format!("unmet gates: {}\n", names.join(", ")));
    }

    if !report.advisories.is_empty() {
        out.push_str("\nadvisories:\n");
        for advisory in &report.advisories {
            out.push_str(&format!("  {advisory}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::plan;
    use crate::scenario::Scenario;
    use chrono::{DateTime, Utc};
    use rcp_kernel::types::{DependencyDescriptor, Node, NodeId};

    #[test]
    fn empty_waves_say_so() {
        assert_eq!(render_waves(&[]), "no schedulable waves\n");
    }

    #[test]
    fn waves_render_one_line_each() {
        let waves = vec![
            Wave {
                index: 0,
                depth: 0,
                nodes: vec![NodeId::new("snapshot")],
            },
            Wave {
                index: 1,
                depth: 1,
                nodes: vec![NodeId::new("promote"), NodeId::new("dns")],
            },
        ];
        assert_eq!(
            render_waves(&waves),
            "wave 0 (depth 0): snapshot\nwave 1 (depth 1): promote, dns\n"
        );
    }

    #[test]
    fn plan_text_carries_verdict_and_waves() {
        let scenario = Scenario::new("restore-db", "payments")
            .created_at(DateTime::<Utc>::UNIX_EPOCH)
            .with_nodes(vec![
                Node::new("snapshot"),
                Node::new("promote").depends_on(DependencyDescriptor::new("snapshot", 4, 0.3)),
            ]);
        let text = render_plan(&plan(&scenario));

        assert!(text.starts_with("plan restore-db (tenant payments): PASS"));
        assert!(text.contains("wave 1 (depth 1): promote"));
        assert!(text.contains("issues: none"));
    }

    #[test]
    fn failing_plan_lists_violations() {
        let scenario = Scenario::new("p", "t")
            .created_at(DateTime::<Utc>::UNIX_EPOCH)
            .with_nodes(vec![
                Node::new("x").depends_on(DependencyDescriptor::new("y", 1, 0.0)),
                Node::new("y").depends_on(DependencyDescriptor::new("x", 1, 0.0)),
            ]);
        let text = render_plan(&plan(&scenario));

        assert!(text.contains("FAIL"));
        assert!(text.contains("graph-cycle"));
        assert!(text.contains("unmet gates: topology"));
        assert!(text.contains("residual: x, y"));
    }
}
