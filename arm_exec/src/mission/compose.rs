//! Mission graph composition
//!
//! Graphs are built with plain functions, there is no builder state. Each combinator states its
//! join policy explicitly.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::Primitive;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A set of primitives started together.
#[derive(Debug)]
pub struct Step {
    /// Primitives which must all finish before the next step starts.
    pub(crate) blocking: Vec<Primitive>,

    /// Primitives which carry on into later steps and must finish before the mission completes.
    pub(crate) background: Vec<Primitive>,
}

/// An ordered list of steps.
#[derive(Debug, Default)]
pub struct MissionGraph {
    pub(crate) steps: Vec<Step>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Step {
    pub fn blocking(&self) -> &[Primitive] {
        &self.blocking
    }

    pub fn background(&self) -> &[Primitive] {
        &self.background
    }
}

impl MissionGraph {
    /// A graph with no steps, which completes as soon as it's run.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the primitives in each step, blocking first.
    pub fn describe(&self) -> Vec<Vec<String>> {
        self.steps
            .iter()
            .map(|s| {
                s.blocking
                    .iter()
                    .chain(s.background.iter())
                    .map(|p| p.name().to_string())
                    .collect()
            })
            .collect()
    }
}

impl From<Primitive> for MissionGraph {
    fn from(p: Primitive) -> Self {
        single(p)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// A graph of one step containing one primitive.
pub fn single(p: Primitive) -> MissionGraph {
    MissionGraph {
        steps: vec![Step {
            blocking: vec![p],
            background: Vec::new(),
        }],
    }
}

/// Run `a` to completion, then `b`.
pub fn sequence(a: impl Into<MissionGraph>, b: impl Into<MissionGraph>) -> MissionGraph {
    let mut graph = a.into();
    graph.steps.extend(b.into().steps);
    graph
}

/// Run each graph in turn.
pub fn sequence_all<I>(parts: I) -> MissionGraph
where
    I: IntoIterator,
    I::Item: Into<MissionGraph>,
{
    parts
        .into_iter()
        .fold(MissionGraph::empty(), |g, p| sequence(g, p))
}

/// Start `a` and `b` together, the step is finished when both are.
pub fn parallel(a: Primitive, b: Primitive) -> MissionGraph {
    parallel_all(vec![a, b])
}

/// Start all primitives together, the step is finished when all are.
pub fn parallel_all(prims: Vec<Primitive>) -> MissionGraph {
    MissionGraph {
        steps: vec![Step {
            blocking: prims,
            background: Vec::new(),
        }],
    }
}

/// Start `blocking` and `background` together. The step is finished when `blocking` is, while
/// `background` keeps running through later steps.
///
/// The arm follows one target at a time. If `background` is an arm move that is still running
/// when a later step starts another arm move, it is superseded and the mission aborts, so a
/// background arm move should only overlap steps that leave the arm alone (drives, waits).
pub fn parallel_background(blocking: Primitive, background: Primitive) -> MissionGraph {
    MissionGraph {
        steps: vec![Step {
            blocking: vec![blocking],
            background: vec![background],
        }],
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn wait(name: &str) -> Primitive {
        Primitive::wait(name, 1.0)
    }

    #[test]
    fn test_composition_shape() {
        let graph = sequence_all(vec![
            single(wait("a")),
            parallel(wait("b"), wait("c")),
            parallel_background(wait("d"), wait("e")),
        ]);

        assert_eq!(graph.num_steps(), 3);
        assert_eq!(
            graph.describe(),
            vec![
                vec!["a".to_string()],
                vec!["b".to_string(), "c".to_string()],
                vec!["d".to_string(), "e".to_string()]
            ]
        );
        assert_eq!(graph.steps()[2].blocking().len(), 1);
        assert_eq!(graph.steps()[2].background().len(), 1);
    }

    #[test]
    fn test_sequence_of_empty_graphs() {
        let graph = sequence(MissionGraph::empty(), wait("a"));
        assert_eq!(graph.num_steps(), 1);

        let graph = sequence_all(Vec::<MissionGraph>::new());
        assert!(graph.is_empty());
    }
}
