use crate::Vertex;
use crate::cell::CellState;
use crate::color::Color;
use crate::error::MoveError;
use crate::graph::Graph;
use crate::hash::BoardHash;

/// Cell states stored as a flat array indexed by vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: Vec<CellState>,
}

impl Board {
    /// Create an all-`Empty` board with `size` vertices.
    pub fn new(size: usize) -> Self {
        Board {
            cells: vec![CellState::Empty; size],
        }
    }

    pub fn from_cells(cells: Vec<CellState>) -> Self {
        Board { cells }
    }

    // -- Accessors --

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    pub fn get(&self, v: Vertex) -> Option<CellState> {
        self.cells.get(v).copied()
    }

    pub fn stone_at(&self, v: Vertex) -> Option<Color> {
        self.get(v).and_then(CellState::stone)
    }

    pub fn on_board(&self, v: Vertex) -> bool {
        v < self.cells.len()
    }

    pub fn count(&self, cell: CellState) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    pub fn hash(&self) -> BoardHash {
        BoardHash::of(&self.cells)
    }

    pub(crate) fn set(&mut self, v: Vertex, cell: CellState) {
        if let Some(slot) = self.cells.get_mut(v) {
            *slot = cell;
        }
    }

    pub(crate) fn clear(&mut self, vertices: &[Vertex]) {
        for &v in vertices {
            self.set(v, CellState::Empty);
        }
    }

    // -- Placement --

    /// Place a stone on a scratch copy, resolve captures and reject suicide.
    /// Returns the new board and the captured vertices. Superko is the
    /// caller's concern since it needs the history.
    pub(crate) fn place_stone(
        &self,
        graph: &Graph,
        v: Vertex,
        color: Color,
    ) -> Result<(Board, Vec<Vertex>), MoveError> {
        if !self.on_board(v) {
            return Err(MoveError::InvalidIndex(v));
        }
        if !self.cells[v].is_empty() {
            return Err(MoveError::Occupied(v));
        }

        let mut board = self.clone();
        board.set(v, CellState::Stone(color));

        let own_liberties = board.liberties(graph, v, None);

        let mut dead_stones = Vec::new();
        for chain in board.opponent_neighbor_chains(graph, v) {
            if board.chain_liberties(graph, &chain).is_empty() {
                dead_stones.extend(chain);
            }
        }

        if own_liberties.is_empty() && dead_stones.is_empty() {
            return Err(MoveError::Suicide);
        }

        board.clear(&dead_stones);
        Ok((board, dead_stones))
    }

    // -- Graph algorithms --

    /// Flood-fill the connected group of same-colored stones through `v`.
    /// Empty or territory cells yield an empty group.
    pub fn chain(&self, graph: &Graph, v: Vertex) -> Vec<Vertex> {
        let mut visited = vec![false; self.cells.len()];
        self.chain_from(graph, v, &mut visited)
    }

    /// Liberties of a pre-computed group.
    pub fn chain_liberties(&self, graph: &Graph, chain: &[Vertex]) -> Vec<Vertex> {
        let mut seen = vec![false; self.cells.len()];
        let mut libs = Vec::new();
        for &p in chain {
            for &n in graph.neighbors(p) {
                if !seen[n] && self.cells[n].is_empty() {
                    seen[n] = true;
                    libs.push(n);
                }
            }
        }
        libs
    }

    /// Liberties of the group through `v`.
    ///
    /// For an `Empty` vertex, `as_color` says which color to evaluate the
    /// vertex as (a hypothetical stone). Passing `None` for an empty vertex
    /// is a caller bug and panics.
    pub fn liberties(&self, graph: &Graph, v: Vertex, as_color: Option<Color>) -> Vec<Vertex> {
        match (self.cells[v], as_color) {
            (CellState::Stone(_), _) => {
                let chain = self.chain(graph, v);
                self.chain_liberties(graph, &chain)
            }
            (CellState::Empty, Some(color)) => {
                let mut board = self.clone();
                board.set(v, CellState::Stone(color));
                let chain = board.chain(graph, v);
                board.chain_liberties(graph, &chain)
            }
            (cell, _) => panic!("liberties requested for {cell:?} at vertex {v} without a color"),
        }
    }

    /// Whether the stone group through `v` has at least one liberty.
    /// Panics when `v` holds no stone.
    pub fn is_alive(&self, graph: &Graph, v: Vertex) -> bool {
        assert!(
            self.stone_at(v).is_some(),
            "life requested for non-stone vertex {v}"
        );
        !self.liberties(graph, v, None).is_empty()
    }

    /// Opponent groups touching the stone at `v`, each listed once.
    fn opponent_neighbor_chains(&self, graph: &Graph, v: Vertex) -> Vec<Vec<Vertex>> {
        let opponent = match self.stone_at(v) {
            Some(c) => c.opp(),
            None => return Vec::new(),
        };

        let mut chains = Vec::new();
        let mut visited = vec![false; self.cells.len()];

        for &n in graph.neighbors(v) {
            if self.stone_at(n) != Some(opponent) || visited[n] {
                continue;
            }
            let ch = self.chain_from(graph, n, &mut visited);
            if !ch.is_empty() {
                chains.push(ch);
            }
        }

        chains
    }

    /// Chain flood-fill using a shared visited bitset.
    fn chain_from(&self, graph: &Graph, v: Vertex, visited: &mut [bool]) -> Vec<Vertex> {
        let color = match self.stone_at(v) {
            Some(c) => c,
            None => return Vec::new(),
        };

        let mut result = Vec::new();
        let mut stack = vec![v];

        while let Some(p) = stack.pop() {
            if visited[p] {
                continue;
            }
            visited[p] = true;
            result.push(p);
            for &n in graph.neighbors(p) {
                if self.stone_at(n) == Some(color) && !visited[n] {
                    stack.push(n);
                }
            }
        }

        result
    }

    /// Every stone group on the board, each listed once.
    pub fn chains(&self, graph: &Graph) -> Vec<Vec<Vertex>> {
        let mut visited = vec![false; self.cells.len()];
        let mut chains = Vec::new();
        for v in 0..self.cells.len() {
            if !visited[v] && self.stone_at(v).is_some() {
                chains.push(self.chain_from(graph, v, &mut visited));
            }
        }
        chains
    }
}
