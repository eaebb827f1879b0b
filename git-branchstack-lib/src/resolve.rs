//! Turns a [`DependencyGraph`] plus a requested topic into the ordered
//! closure of topics the Replay Engine must rebuild, in dependency order.

use indexmap::IndexMap;
use tracing::warn;

use crate::scan::DependencyGraph;

/// `topic -> keep_tag` for every topic in a requested topic's transitive
/// dependency closure, including the topic itself.
pub type Closure = IndexMap<String, bool>;

/// Depth-first walk of `graph` starting at `(topic, keep_tag)`. Each topic
/// is marked on first arrival; later arrivals (including via a cycle) are
/// no-ops, so the first edge's `keep_tag` wins and recursion always
/// terminates.
///
/// A declared parent edge whose topic has no entry in `graph` at all (never
/// observed in the scanned range) is reported to stderr and excluded from
/// the closure; it cannot be replayed because there is nothing to replay.
pub fn closure(graph: &DependencyGraph, topic: &str, keep_tag: bool) -> Closure {
    let mut visited = Closure::new();
    closure_rec(graph, topic, keep_tag, &mut visited);
    visited
}

fn closure_rec(graph: &DependencyGraph, topic: &str, keep_tag: bool, visited: &mut Closure) {
    if visited.contains_key(topic) {
        return;
    }
    visited.insert(topic.to_string(), keep_tag);

    let Some(parents) = graph.get(topic) else {
        return;
    };
    for (parent_topic, parent_keep_tag) in parents {
        if !graph.contains_key(parent_topic) {
            warn!(
                topic,
                parent_topic, "topic depends on a topic that was never observed; skipping"
            );
            continue;
        }
        closure_rec(graph, parent_topic, *parent_keep_tag, visited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[(&str, bool)])]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (topic, parents) in edges {
            let entry = graph.entry(topic.to_string()).or_default();
            for (parent, keep_tag) in *parents {
                entry.insert(parent.to_string(), *keep_tag);
            }
        }
        graph
    }

    #[test]
    fn test_linear_chain() {
        let graph = graph(&[("c", &[("b", false)]), ("b", &[("a", false)]), ("a", &[])]);
        let closure = closure(&graph, "c", false);
        assert_eq!(
            closure.keys().cloned().collect::<Vec<_>>(),
            vec!["c", "b", "a"]
        );
    }

    #[test]
    fn test_cycle_terminates() {
        let graph = graph(&[("a", &[("b", false)]), ("b", &[("a", false)])]);
        let closure = closure(&graph, "a", false);
        assert_eq!(closure.keys().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_first_arrival_wins_keep_tag() {
        // `c` depends on both `first` and `second`, each of which depends on
        // `a` with a different `keep_tag`. `first` is declared before
        // `second` on `c`'s subject, so its edge to `a` (keep_tag = false)
        // should win over `second`'s (keep_tag = true).
        let mut graph = DependencyGraph::new();
        graph.entry("a".to_string()).or_default();
        graph
            .entry("first".to_string())
            .or_default()
            .insert("a".to_string(), false);
        graph
            .entry("second".to_string())
            .or_default()
            .insert("a".to_string(), true);
        let c = graph.entry("c".to_string()).or_default();
        c.insert("first".to_string(), false);
        c.insert("second".to_string(), false);

        let closure = closure(&graph, "c", false);
        assert_eq!(closure.get("a"), Some(&false));
    }

    #[test]
    fn test_missing_parent_excluded() {
        let graph = graph(&[("a", &[("ghost", false)])]);
        let closure = closure(&graph, "a", false);
        assert_eq!(closure.keys().cloned().collect::<Vec<_>>(), vec!["a"]);
        assert!(!closure.contains_key("ghost"));
    }
}
