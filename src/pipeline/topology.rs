//! Design compilation.
//!
//! Compilation runs in two phases. The first rejects every structural problem
//! and turns each condition string into a typed [`Condition`]. The second
//! builds an immutable [`CompiledGraph`] from that validated data only.

use std::collections::{HashMap, HashSet};
use crate::agents::role::AgentRole;
use crate::errors::FlowError;
use super::condition::Condition;
use super::design::{AgentSpec, Design};
use super::state::PipelineState;

pub const MAX_AGENTS: usize = 20;

/// Where control goes after a node completes.
#[derive(Debug, Clone, PartialEq)]
pub enum Routing {
    Terminal,
    Next(usize),
    /// Every true condition fires. `fallback` runs when none do.
    Branch {
        branches: Vec<(Condition, usize)>,
        fallback: Option<usize>,
    },
    FanOut(Vec<usize>),
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: String,
    pub spec: AgentSpec,
    pub role: AgentRole,
    pub routing: Routing,
}

#[derive(Debug, Clone)]
pub struct CompiledGraph {
    pub nodes: Vec<GraphNode>,
    pub entries: Vec<usize>,
    pub explicit: bool,
    /// Distinct sources of every edge into each node.
    pub predecessors: Vec<Vec<usize>>,
    /// `reachable[a][b]` holds when some path leads from `a` to `b`.
    reachable: Vec<Vec<bool>>,
}

struct ValidatedEdge {
    source: usize,
    target: usize,
    condition: Option<Condition>,
}

impl CompiledGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a path of one or more edges leads from `from` to `to`.
    pub fn reaches(&self, from: usize, to: usize) -> bool {
        self.reachable
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(false)
    }

    /// Nodes to launch after `index` completed, given the merged state.
    /// Nothing is launched once the run's stop condition holds.
    pub fn successors(&self, index: usize, state: &PipelineState) -> Vec<usize> {
        if state.should_stop() {
            return Vec::new();
        }
        let Some(node) = self.nodes.get(index) else {
            return Vec::new();
        };
        match &node.routing {
            Routing::Terminal => Vec::new(),
            Routing::Next(next) => vec![*next],
            Routing::FanOut(targets) => targets.clone(),
            Routing::Branch { branches, fallback } => {
                let fired: Vec<usize> = branches
                    .iter()
                    .filter(|(condition, _)| condition.evaluate(state))
                    .map(|(_, target)| *target)
                    .collect();
                if fired.is_empty() {
                    fallback.iter().copied().collect()
                } else {
                    fired
                }
            }
        }
    }

    /// One line per node, for display.
    pub fn summary(&self) -> Vec<String> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let entry = if self.entries.contains(&i) { "* " } else { "  " };
                let route = match &node.routing {
                    Routing::Terminal => "end".to_string(),
                    Routing::Next(n) => format!("-> {}", self.nodes[*n].id),
                    Routing::FanOut(targets) => format!(
                        "-> [{}]",
                        targets.iter().map(|t| self.nodes[*t].id.as_str()).collect::<Vec<_>>().join(", ")
                    ),
                    Routing::Branch { branches, fallback } => {
                        let mut parts: Vec<String> = branches
                            .iter()
                            .map(|(c, t)| format!("{} if {}", self.nodes[*t].id, c))
                            .collect();
                        if let Some(f) = fallback {
                            parts.push(format!("{} otherwise", self.nodes[*f].id));
                        }
                        format!("-> {{{}}}", parts.join("; "))
                    }
                };
                format!("{}{} ({}) {}", entry, node.id, node.role, route)
            })
            .collect()
    }
}

/// Compile a design into an executable graph.
pub fn compile(design: &Design) -> Result<CompiledGraph, FlowError> {
    let edges = validate(design)?;
    let ids = unique_ids(&design.agents);
    build(design, ids, edges)
}

fn validate(design: &Design) -> Result<Option<Vec<ValidatedEdge>>, FlowError> {
    if design.agents.is_empty() {
        return Err(FlowError::Compile("Design has no agents".into()));
    }
    if design.agents.len() > MAX_AGENTS {
        return Err(FlowError::Compile(format!(
            "Design has {} agents, at most {} are allowed",
            design.agents.len(),
            MAX_AGENTS
        )));
    }
    for spec in &design.agents {
        spec.validate()?;
    }

    let Some(edges) = design.explicit_edges() else {
        return Ok(None);
    };

    // Edges name agents by declared name; a duplicated name resolves to its first declaration.
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for (i, spec) in design.agents.iter().enumerate() {
        by_name.entry(spec.name.as_str()).or_insert(i);
    }

    let lookup = |name: &str| {
        by_name
            .get(name)
            .copied()
            .ok_or_else(|| FlowError::Compile(format!("Edge references undeclared agent '{}'", name)))
    };

    let mut validated = Vec::with_capacity(edges.len());
    for edge in edges {
        let condition = match edge.condition.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(Condition::parse(text)?),
            _ => None,
        };
        validated.push(ValidatedEdge {
            source: lookup(&edge.source)?,
            target: lookup(&edge.target)?,
            condition,
        });
    }
    Ok(Some(validated))
}

/// Declared names with an incrementing suffix on repeats: `a`, `a_2`, `a_3`.
fn unique_ids(agents: &[AgentSpec]) -> Vec<String> {
    let mut taken: HashSet<String> = agents.iter().map(|a| a.name.clone()).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ids = Vec::with_capacity(agents.len());
    for agent in agents {
        if seen.insert(agent.name.as_str()) {
            ids.push(agent.name.clone());
            continue;
        }
        let mut suffix = 2;
        let id = loop {
            let candidate = format!("{}_{}", agent.name, suffix);
            if taken.insert(candidate.clone()) {
                break candidate;
            }
            suffix += 1;
        };
        ids.push(id);
    }
    ids
}

fn build(design: &Design, ids: Vec<String>, edges: Option<Vec<ValidatedEdge>>) -> Result<CompiledGraph, FlowError> {
    let count = design.agents.len();

    let Some(edges) = edges else {
        let nodes = design
            .agents
            .iter()
            .zip(ids)
            .enumerate()
            .map(|(i, (spec, id))| GraphNode {
                id,
                role: AgentRole::resolve(spec),
                spec: spec.clone(),
                routing: if i + 1 < count { Routing::Next(i + 1) } else { Routing::Terminal },
            })
            .collect();
        let children: Vec<Vec<usize>> = (0..count).map(|i| if i + 1 < count { vec![i + 1] } else { Vec::new() }).collect();
        let predecessors = (0..count).map(|i| if i > 0 { vec![i - 1] } else { Vec::new() }).collect();
        return Ok(CompiledGraph {
            nodes,
            entries: vec![0],
            explicit: false,
            predecessors,
            reachable: reachability(&children),
        });
    };

    let mut outgoing: Vec<Vec<&ValidatedEdge>> = vec![Vec::new(); count];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); count];
    for edge in &edges {
        outgoing[edge.source].push(edge);
        if !predecessors[edge.target].contains(&edge.source) {
            predecessors[edge.target].push(edge.source);
        }
    }

    let entries: Vec<usize> = (0..count).filter(|i| predecessors[*i].is_empty()).collect();
    if entries.is_empty() {
        return Err(FlowError::Compile(
            "Design has a cycle: every agent has an incoming edge, so there is no entry point".into(),
        ));
    }

    if let Some(path) = find_cycle(&outgoing) {
        let names: Vec<&str> = path.iter().map(|i| ids[*i].as_str()).collect();
        return Err(FlowError::Compile(format!("Design has a cycle: {}", names.join(" -> "))));
    }

    let nodes = design
        .agents
        .iter()
        .zip(ids.iter())
        .enumerate()
        .map(|(i, (spec, id))| GraphNode {
            id: id.clone(),
            role: AgentRole::resolve(spec),
            spec: spec.clone(),
            routing: routing_for(&outgoing[i]),
        })
        .collect();

    let children: Vec<Vec<usize>> = outgoing
        .iter()
        .map(|edges| edges.iter().map(|e| e.target).collect())
        .collect();

    Ok(CompiledGraph {
        nodes,
        entries,
        explicit: true,
        predecessors,
        reachable: reachability(&children),
    })
}

/// Transitive closure of an acyclic child list.
fn reachability(children: &[Vec<usize>]) -> Vec<Vec<bool>> {
    let count = children.len();
    let mut reachable = vec![vec![false; count]; count];
    for start in 0..count {
        let mut stack: Vec<usize> = children[start].clone();
        while let Some(node) = stack.pop() {
            if reachable[start][node] {
                continue;
            }
            reachable[start][node] = true;
            stack.extend(children[node].iter().copied());
        }
    }
    reachable
}

fn routing_for(outgoing: &[&ValidatedEdge]) -> Routing {
    let conditional: Vec<(Condition, usize)> = outgoing
        .iter()
        .filter_map(|e| e.condition.clone().map(|c| (c, e.target)))
        .collect();
    let mut unconditional: Vec<usize> = Vec::new();
    for edge in outgoing.iter().filter(|e| e.condition.is_none()) {
        if !unconditional.contains(&edge.target) {
            unconditional.push(edge.target);
        }
    }

    if !conditional.is_empty() {
        return Routing::Branch {
            branches: conditional,
            fallback: unconditional.last().copied(),
        };
    }
    match unconditional.as_slice() {
        [] => Routing::Terminal,
        [next] => Routing::Next(*next),
        _ => Routing::FanOut(unconditional),
    }
}

/// DFS with a recursion stack. Returns the closing path of the first cycle.
fn find_cycle(outgoing: &[Vec<&ValidatedEdge>]) -> Option<Vec<usize>> {
    fn visit(
        node: usize,
        outgoing: &[Vec<&ValidatedEdge>],
        visited: &mut [bool],
        stack: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        if let Some(pos) = stack.iter().position(|n| *n == node) {
            let mut path = stack[pos..].to_vec();
            path.push(node);
            return Some(path);
        }
        if visited[node] {
            return None;
        }
        visited[node] = true;
        stack.push(node);
        for edge in &outgoing[node] {
            if let Some(path) = visit(edge.target, outgoing, visited, stack) {
                return Some(path);
            }
        }
        stack.pop();
        None
    }

    let mut visited = vec![false; outgoing.len()];
    let mut stack = Vec::new();
    (0..outgoing.len()).find_map(|start| visit(start, outgoing, &mut visited, &mut stack))
}
