//! The search engine.
//!
//! Nodes live in an append-only [`Arena`] and refer to their parent by
//! [`NodeId`]. A single loop drives every strategy; the [`Frontier`] type
//! decides the expansion order.

use std::mem;
use std::ops::{ControlFlow, Index};
use std::time::{Duration, Instant};

use anyhow::{ensure, Result};
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::frontier::{BestFirst, Fifo, Frontier, Lifo};
use crate::{heuristic, Board, Direction};

type IndexSet<K> = indexmap::IndexSet<K, fxhash::FxBuildHasher>;

/// Emit a debug progress line every this many expansions.
const PROGRESS_INTERVAL: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct SearchNode {
    pub board: Board,
    pub parent: Option<NodeId>,
    /// The slide that produced this node, `None` for the root.
    pub dir: Option<Direction>,
    pub depth: u32,
    /// Heuristic estimate, only filled in by best-first search.
    pub cost: u32,
}

impl SearchNode {
    fn root(board: Board) -> Self {
        Self {
            board,
            parent: None,
            dir: None,
            depth: 0,
            cost: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<SearchNode>,
}

impl Index<NodeId> for Arena {
    type Output = SearchNode;
    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl Arena {
    fn push(&mut self, node: SearchNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes from the root down to `id`, following parent links.
    pub fn path_to(&self, id: NodeId) -> Vec<&SearchNode> {
        let mut path = std::iter::successors(Some(&self[id]), |node| {
            node.parent.map(|parent| &self[parent])
        })
        .collect::<Vec<_>>();
        path.reverse();
        path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
pub enum Strategy {
    #[serde(rename = "bfs")]
    #[value(name = "bfs")]
    BreadthFirst,
    #[serde(rename = "dfs")]
    #[value(name = "dfs")]
    DepthFirst,
    #[serde(rename = "astar")]
    #[value(name = "astar")]
    BestFirst,
}

impl Strategy {
    pub const ALL: [Self; 3] = [Self::BreadthFirst, Self::DepthFirst, Self::BestFirst];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::BreadthFirst => "bfs",
            Strategy::DepthFirst => "dfs",
            Strategy::BestFirst => "astar",
        }
    }
}

/// When a board enters the visited set.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
pub enum VisitPolicy {
    /// When its node is popped for expansion. A board may be queued several
    /// times before that, and every copy popped is counted as visited.
    #[default]
    #[serde(rename = "expand")]
    #[value(name = "expand")]
    OnExpand,
    /// As soon as it is generated; each board is queued at most once.
    #[serde(rename = "discover")]
    #[value(name = "discover")]
    OnDiscover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Solved,
    /// The frontier ran dry without reaching the goal.
    Exhausted,
    /// The step hook asked to stop.
    Interrupted,
}

/// Passed to the step hook before each expansion.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub nodes_visited: usize,
    pub depth: u32,
    pub frontier_len: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    pub nodes_visited: usize,
    pub elapsed: Duration,
    /// Largest number of bytes held by the arena, frontier and visited set at
    /// any point of the run.
    pub peak_bytes: usize,
}

impl Stats {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Root-to-goal sequence of boards and the slides between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub boards: Vec<Board>,
    pub moves: Vec<Direction>,
}

impl Solution {
    fn from_path(path: &[&SearchNode]) -> Self {
        Self {
            boards: path.iter().map(|node| node.board.clone()).collect(),
            moves: path.iter().filter_map(|node| node.dir).collect(),
        }
    }

    /// Number of slides.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SearchReport {
    pub strategy: Strategy,
    pub policy: VisitPolicy,
    pub status: Status,
    pub solution: Option<Solution>,
    pub stats: Stats,
}

impl SearchReport {
    pub fn found(&self) -> bool {
        self.status == Status::Solved
    }
}

#[derive(Debug, Default)]
struct MemoryGauge {
    arena: usize,
    visited: usize,
    peak: usize,
}

impl MemoryGauge {
    fn add_node(&mut self, board: &Board) {
        self.arena += mem::size_of::<SearchNode>() + board.heap_bytes();
    }

    fn add_visited(&mut self, board: &Board) {
        // Stored key, its hash and the index table slot.
        self.visited += mem::size_of::<Board>()
            + board.heap_bytes()
            + mem::size_of::<u64>()
            + mem::size_of::<usize>();
    }

    fn observe(&mut self, frontier_bytes: usize) {
        self.peak = self.peak.max(self.arena + self.visited + frontier_bytes);
    }
}

enum Outcome {
    Found(NodeId),
    Exhausted,
    Interrupted,
}

/// Runs `strategy` from `initial` until `goal` is popped or the frontier is
/// exhausted.
///
/// `on_step` is called before every expansion and may stop the search by
/// returning [`ControlFlow::Break`].
pub fn solve(
    strategy: Strategy,
    initial: &Board,
    goal: &Board,
    policy: VisitPolicy,
    on_step: impl FnMut(&Progress) -> ControlFlow<()>,
) -> Result<SearchReport> {
    match strategy {
        Strategy::BreadthFirst => bfs(initial, goal, policy, on_step),
        Strategy::DepthFirst => dfs(initial, goal, policy, on_step),
        Strategy::BestFirst => best_first(initial, goal, policy, on_step),
    }
}

/// Breadth-first search. The solution, if any, has the fewest moves.
pub fn bfs(
    initial: &Board,
    goal: &Board,
    policy: VisitPolicy,
    on_step: impl FnMut(&Progress) -> ControlFlow<()>,
) -> Result<SearchReport> {
    search::<Fifo>(Strategy::BreadthFirst, initial, goal, policy, on_step)
}

/// Depth-first search, exploring slides in [`Direction::ALL`] order.
pub fn dfs(
    initial: &Board,
    goal: &Board,
    policy: VisitPolicy,
    on_step: impl FnMut(&Progress) -> ControlFlow<()>,
) -> Result<SearchReport> {
    search::<Lifo>(Strategy::DepthFirst, initial, goal, policy, on_step)
}

/// A* ordered by `depth + misplaced tiles`.
pub fn best_first(
    initial: &Board,
    goal: &Board,
    policy: VisitPolicy,
    on_step: impl FnMut(&Progress) -> ControlFlow<()>,
) -> Result<SearchReport> {
    search::<BestFirst>(Strategy::BestFirst, initial, goal, policy, on_step)
}

pub fn search<F: Frontier>(
    strategy: Strategy,
    initial: &Board,
    goal: &Board,
    policy: VisitPolicy,
    mut on_step: impl FnMut(&Progress) -> ControlFlow<()>,
) -> Result<SearchReport> {
    ensure!(
        initial.size() == goal.size(),
        "Board size mismatch: initial is {0}x{0}, goal is {1}x{1}",
        initial.size(),
        goal.size(),
    );

    info!(
        event = "search_start",
        strategy = %strategy,
        policy = %policy,
        size = initial.size(),
    );
    let start = Instant::now();

    let mut arena = Arena::default();
    let mut frontier = F::default();
    let mut visited = IndexSet::default();
    let mut gauge = MemoryGauge::default();

    gauge.add_node(initial);
    let root = arena.push(SearchNode::root(initial.clone()));
    if policy == VisitPolicy::OnDiscover {
        gauge.add_visited(initial);
        visited.insert(initial.clone());
    }
    frontier.push(root, 0);
    gauge.observe(frontier.len() * F::ENTRY_SIZE);

    let mut nodes_visited = 0;
    let outcome = loop {
        #[cfg(feature = "coz")]
        coz::scope!("Expand");

        let Some(id) = frontier.pop() else {
            break Outcome::Exhausted;
        };
        nodes_visited += 1;

        let node = &arena[id];
        if node.board == *goal {
            break Outcome::Found(id);
        }

        let progress = Progress {
            nodes_visited,
            depth: node.depth,
            frontier_len: frontier.len(),
        };
        if nodes_visited % PROGRESS_INTERVAL == 0 {
            debug!(
                strategy = %strategy,
                nodes_visited,
                depth = node.depth,
                frontier = frontier.len(),
                arena = arena.len(),
            );
        }
        if on_step(&progress).is_break() {
            break Outcome::Interrupted;
        }

        trace!(node = id.0, depth = node.depth, board = %node.board, "expand");
        if policy == VisitPolicy::OnExpand && !visited.contains(&node.board) {
            gauge.add_visited(&node.board);
            visited.insert(node.board.clone());
        }

        let depth = node.depth + 1;
        let mut children = node.board.moves();
        if F::REVERSED {
            children.reverse();
        }
        for (board, dir) in children {
            let fresh = match policy {
                VisitPolicy::OnExpand => !visited.contains(&board),
                VisitPolicy::OnDiscover => {
                    let fresh = !visited.contains(&board);
                    if fresh {
                        gauge.add_visited(&board);
                        visited.insert(board.clone());
                    }
                    fresh
                }
            };
            if !fresh {
                continue;
            }

            let cost = if F::INFORMED {
                heuristic::misplaced(&board, goal)
            } else {
                0
            };
            gauge.add_node(&board);
            let child = arena.push(SearchNode {
                board,
                parent: Some(id),
                dir: Some(dir),
                depth,
                cost,
            });
            frontier.push(child, depth + cost);
        }
        gauge.observe(frontier.len() * F::ENTRY_SIZE);
    };

    let (status, solution) = match outcome {
        Outcome::Found(id) => (Status::Solved, Some(Solution::from_path(&arena.path_to(id)))),
        Outcome::Exhausted => (Status::Exhausted, None),
        Outcome::Interrupted => (Status::Interrupted, None),
    };
    let stats = Stats {
        nodes_visited,
        elapsed: start.elapsed(),
        peak_bytes: gauge.peak,
    };

    info!(
        event = "search_end",
        strategy = %strategy,
        status = ?status,
        nodes_visited,
        moves = solution.as_ref().map(Solution::len),
        elapsed_secs = stats.elapsed_secs(),
        peak_bytes = stats.peak_bytes,
    );

    Ok(SearchReport {
        strategy,
        policy,
        status,
        solution,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    fn run(strategy: Strategy, initial: &Board, policy: VisitPolicy) -> SearchReport {
        let goal = Board::goal(initial.size() as u8).unwrap();
        solve(strategy, initial, &goal, policy, |_| ControlFlow::Continue(())).unwrap()
    }

    fn replay(initial: &Board, moves: &[Direction]) -> Board {
        moves
            .iter()
            .fold(initial.clone(), |board, &dir| board.go(dir).unwrap())
    }

    #[test]
    fn scenario_solved_by_every_strategy() {
        let initial = board("2 X 3 1 4 5 6 7 8");
        let goal = Board::goal(3).unwrap();
        for strategy in Strategy::ALL {
            let report = run(strategy, &initial, VisitPolicy::OnExpand);
            assert!(report.found(), "{strategy}");
            let solution = report.solution.unwrap();
            assert_eq!(solution.boards.first(), Some(&initial));
            assert_eq!(solution.boards.last(), Some(&goal));
            assert_eq!(solution.boards.len(), solution.len() + 1);
            assert_eq!(replay(&initial, &solution.moves), goal);
            for (w, &dir) in solution.boards.windows(2).zip(&solution.moves) {
                assert_eq!(w[0].go(dir).as_ref(), Some(&w[1]));
            }
            assert!(report.stats.peak_bytes > 0);
        }
    }

    #[test]
    fn scenario_node_counts() {
        let initial = board("2 X 3 1 4 5 6 7 8");
        let expected = [
            (Strategy::BreadthFirst, VisitPolicy::OnExpand, 23393, 17),
            (Strategy::BreadthFirst, VisitPolicy::OnDiscover, 18297, 17),
            (Strategy::DepthFirst, VisitPolicy::OnExpand, 216766, 33609),
            (Strategy::DepthFirst, VisitPolicy::OnDiscover, 127332, 55133),
            (Strategy::BestFirst, VisitPolicy::OnExpand, 1182, 17),
            (Strategy::BestFirst, VisitPolicy::OnDiscover, 1077, 17),
        ];
        for (strategy, policy, nodes, moves) in expected {
            let report = run(strategy, &initial, policy);
            assert_eq!(report.stats.nodes_visited, nodes, "{strategy}/{policy}");
            assert_eq!(report.solution.unwrap().len(), moves, "{strategy}/{policy}");
        }
    }

    #[test]
    fn breadth_first_is_shortest() {
        for input in ["2 X 3 1 4 5 6 7 8", "1 2 3 X 4 6 7 5 8", "4 1 3 X 2 6 7 5 8"] {
            let initial = board(input);
            let len = |strategy| run(strategy, &initial, VisitPolicy::OnExpand).solution.unwrap().len();
            let shortest = len(Strategy::BreadthFirst);
            assert!(shortest <= len(Strategy::DepthFirst), "{input}");
            assert_eq!(shortest, len(Strategy::BestFirst), "{input}");
        }
    }

    #[test]
    fn deterministic_runs() {
        let initial = board("4 1 3 X 2 6 7 5 8");
        for strategy in Strategy::ALL {
            let a = run(strategy, &initial, VisitPolicy::OnExpand);
            let b = run(strategy, &initial, VisitPolicy::OnExpand);
            assert_eq!(a.stats.nodes_visited, b.stats.nodes_visited);
            assert_eq!(a.solution, b.solution);
            assert_eq!(a.stats.peak_bytes, b.stats.peak_bytes);
        }
    }

    #[test]
    fn blank_only_board_is_already_solved() {
        let initial = board("X");
        for strategy in Strategy::ALL {
            let report = run(strategy, &initial, VisitPolicy::OnExpand);
            assert_eq!(report.status, Status::Solved);
            assert_eq!(report.stats.nodes_visited, 1);
            let solution = report.solution.unwrap();
            assert!(solution.is_empty());
            assert_eq!(solution.boards, [initial.clone()]);
        }
    }

    #[test]
    fn unsolvable_board_exhausts() {
        // Half of the 24 arrangements of a 2x2 board are reachable.
        let initial = board("2 1 3 X");
        for strategy in Strategy::ALL {
            let report = run(strategy, &initial, VisitPolicy::OnDiscover);
            assert_eq!(report.status, Status::Exhausted);
            assert!(report.solution.is_none());
            assert_eq!(report.stats.nodes_visited, 12);
        }
    }

    #[test]
    fn step_hook_interrupts() {
        let initial = board("2 X 3 1 4 5 6 7 8");
        let goal = Board::goal(3).unwrap();
        let mut calls = 0;
        let report = bfs(&initial, &goal, VisitPolicy::OnExpand, |progress| {
            calls += 1;
            assert_eq!(progress.nodes_visited, calls);
            if progress.nodes_visited >= 100 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
        assert_eq!(report.status, Status::Interrupted);
        assert_eq!(report.stats.nodes_visited, 100);
        assert_eq!(calls, 100);
        assert!(report.solution.is_none());
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let initial = board("1 2 3 X");
        let goal = Board::goal(3).unwrap();
        assert!(dfs(&initial, &goal, VisitPolicy::OnExpand, |_| ControlFlow::Continue(())).is_err());
    }

    #[test]
    fn path_follows_parent_links() {
        let mut arena = Arena::default();
        let root = arena.push(SearchNode::root(Board::goal(2).unwrap()));
        let mut id = root;
        for dir in [Direction::Up, Direction::Left, Direction::Down] {
            let board = arena[id].board.go(dir).unwrap();
            id = arena.push(SearchNode {
                board,
                parent: Some(id),
                dir: Some(dir),
                depth: arena[id].depth + 1,
                cost: 0,
            });
        }
        let path = arena.path_to(id);
        assert_eq!(path.len(), 4);
        assert_eq!(path[0].parent, None);
        assert_eq!(
            path.iter().filter_map(|node| node.dir).collect::<Vec<_>>(),
            [Direction::Up, Direction::Left, Direction::Down],
        );
        assert_eq!(path.iter().map(|node| node.depth).collect::<Vec<_>>(), [0, 1, 2, 3]);
    }
}
