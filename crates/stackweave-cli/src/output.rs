//! Formatted output helpers for CLI commands.

use stackweave_common::types::NodeId;
use stackweave_compose::routing::RoutingRule;

/// Formats the deployment order as numbered lines, dependencies first.
#[must_use]
pub fn format_order(order: &[NodeId]) -> String {
    order
        .iter()
        .enumerate()
        .map(|(i, id)| format!("  {}. {id}\n", i + 1))
        .collect()
}

/// Formats one routing rule as a single line.
#[must_use]
pub fn format_route(rule: &RoutingRule) -> String {
    format!(
        "  {} -> {}  (priority {})",
        rule.path_pattern, rule.target, rule.priority
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_order_numbers_from_one() {
        let order = vec![NodeId::new("identity"), NodeId::new("api")];
        let rendered = format_order(&order);
        assert_eq!(rendered, "  1. identity\n  2. api\n");
    }

    #[test]
    fn format_route_shows_pattern_target_and_priority() {
        let rule = RoutingRule {
            distribution: NodeId::new("cdn"),
            path_pattern: "/api/*".into(),
            target: NodeId::new("api"),
            priority: 100,
        };
        assert_eq!(format_route(&rule), "  /api/* -> api  (priority 100)");
    }
}
