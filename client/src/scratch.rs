//! Cosmetic scratch grid.
//!
//! The backend has already decided the play before any of this runs. The grid
//! only has to look consistent with that decision: a win shows the prize three
//! times, a loss never shows any prize three times.

use raspadinha_types::{
    scratch::{PlayResult, Prize},
    Id,
};
use rand::seq::SliceRandom;
use rand::Rng;

pub const GRID_TILES: usize = 9;
pub const GRID_COLUMNS: usize = 3;

/// Tiles revealed by hand before the rest uncover themselves.
pub const AUTO_REVEAL_AFTER: usize = 7;

const WINNING_COPIES: usize = 3;
const MAX_FILLER_COPIES: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Prize(Id),
    Blank,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    tiles: Vec<Symbol>,
}

impl Grid {
    /// Lay out a grid for `result` using the card's prize table.
    pub fn for_result<R: Rng + ?Sized>(result: &PlayResult, prizes: &[Prize], rng: &mut R) -> Self {
        let winner = result.winning_prize().map(|prize| &prize.id);
        Self::generate(winner, prizes, rng)
    }

    /// Lay out a grid where only `winner` (if any) appears three times.
    pub fn generate<R: Rng + ?Sized>(winner: Option<&Id>, prizes: &[Prize], rng: &mut R) -> Self {
        let mut tiles = Vec::with_capacity(GRID_TILES);
        if let Some(winner) = winner {
            tiles.extend(std::iter::repeat(Symbol::Prize(winner.clone())).take(WINNING_COPIES));
        }

        let mut fillers: Vec<&Id> = Vec::new();
        for prize in prizes {
            if Some(&prize.id) == winner || fillers.contains(&&prize.id) {
                continue;
            }
            fillers.push(&prize.id);
        }
        let mut pool: Vec<Symbol> = fillers
            .into_iter()
            .flat_map(|id| std::iter::repeat(Symbol::Prize(id.clone())).take(MAX_FILLER_COPIES))
            .collect();
        pool.shuffle(rng);

        let missing = GRID_TILES - tiles.len();
        tiles.extend(pool.into_iter().take(missing));
        tiles.resize(GRID_TILES, Symbol::Blank);
        tiles.shuffle(rng);
        Self { tiles }
    }

    pub fn tiles(&self) -> &[Symbol] {
        &self.tiles
    }

    pub fn get(&self, index: usize) -> Option<&Symbol> {
        self.tiles.get(index)
    }

    pub fn count(&self, id: &Id) -> usize {
        self.tiles
            .iter()
            .filter(|symbol| matches!(symbol, Symbol::Prize(tile) if tile == id))
            .count()
    }

    /// Prize shown three or more times, if any.
    pub fn winning_symbol(&self) -> Option<&Id> {
        self.tiles.iter().find_map(|symbol| match symbol {
            Symbol::Prize(id) if self.count(id) >= WINNING_COPIES => Some(id),
            _ => None,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Symbol]> {
        self.tiles.chunks(GRID_COLUMNS)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealState {
    Playing,
    Completed,
}

/// A played card being uncovered. Purely local; never calls the backend.
#[derive(Clone, Debug)]
pub struct ScratchTicket {
    result: PlayResult,
    grid: Grid,
    revealed: [bool; GRID_TILES],
    state: RevealState,
}

impl ScratchTicket {
    pub fn new(result: PlayResult, grid: Grid) -> Self {
        Self {
            result,
            grid,
            revealed: [false; GRID_TILES],
            state: RevealState::Playing,
        }
    }

    pub fn result(&self) -> &PlayResult {
        &self.result
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.get(index).copied().unwrap_or(false)
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.iter().filter(|revealed| **revealed).count()
    }

    /// Uncover one tile. Out-of-range indexes are ignored.
    pub fn scratch(&mut self, index: usize) -> RevealState {
        if self.state == RevealState::Completed {
            return self.state;
        }
        if let Some(tile) = self.revealed.get_mut(index) {
            *tile = true;
        }
        if self.revealed_count() >= AUTO_REVEAL_AFTER {
            self.reveal_all();
        }
        self.state
    }

    pub fn reveal_all(&mut self) -> RevealState {
        self.revealed = [true; GRID_TILES];
        self.state = RevealState::Completed;
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};
    use raspadinha_types::Amount;

    fn prizes(count: usize) -> Vec<Prize> {
        (0..count)
            .map(|i| Prize {
                id: Id::from(i as u64),
                name: format!("Prize {i}"),
                value: Amount::from_reais(i as i64 + 1),
                kind: Default::default(),
                image_url: None,
            })
            .collect()
    }

    fn result(prize: Option<Prize>) -> PlayResult {
        PlayResult {
            game_id: Id::from("g"),
            is_winner: prize.is_some(),
            prize,
            new_balance: Amount::ZERO,
        }
    }

    #[test]
    fn test_winning_grid_has_three_matches() {
        let table = prizes(6);
        let mut rng = StdRng::seed_from_u64(7);
        let grid = Grid::for_result(&result(Some(table[2].clone())), &table, &mut rng);
        assert_eq!(grid.tiles().len(), GRID_TILES);
        assert_eq!(grid.count(&table[2].id), 3);
        assert_eq!(grid.winning_symbol(), Some(&table[2].id));
    }

    #[test]
    fn test_small_table_pads_with_blanks() {
        let table = prizes(1);
        let mut rng = StdRng::seed_from_u64(1);
        let grid = Grid::generate(None, &table, &mut rng);
        assert_eq!(grid.count(&table[0].id), 2);
        assert_eq!(grid.tiles().iter().filter(|s| **s == Symbol::Blank).count(), 7);
        assert!(grid.winning_symbol().is_none());
    }

    #[test]
    fn test_scratch_auto_completes() {
        let table = prizes(5);
        let mut rng = StdRng::seed_from_u64(3);
        let grid = Grid::generate(None, &table, &mut rng);
        let mut ticket = ScratchTicket::new(result(None), grid);

        for index in 0..AUTO_REVEAL_AFTER - 1 {
            assert_eq!(ticket.scratch(index), RevealState::Playing);
        }
        // Scratching the same tile twice does not count double
        assert_eq!(ticket.scratch(0), RevealState::Playing);
        assert_eq!(ticket.scratch(42), RevealState::Playing);
        assert_eq!(ticket.scratch(AUTO_REVEAL_AFTER - 1), RevealState::Completed);
        assert_eq!(ticket.revealed_count(), GRID_TILES);
    }

    #[test]
    fn test_reveal_all() {
        let table = prizes(4);
        let mut rng = StdRng::seed_from_u64(9);
        let grid = Grid::for_result(&result(Some(table[0].clone())), &table, &mut rng);
        let mut ticket = ScratchTicket::new(result(Some(table[0].clone())), grid);
        assert_eq!(ticket.reveal_all(), RevealState::Completed);
        assert!((0..GRID_TILES).all(|i| ticket.is_revealed(i)));
        assert_eq!(ticket.scratch(0), RevealState::Completed);
    }

    proptest! {
        #[test]
        fn winning_grids_show_prize_exactly_three_times(
            table_size in 1usize..12,
            winner in 0usize..12,
            seed in any::<u64>(),
        ) {
            let table = prizes(table_size);
            let prize = table[winner % table_size].clone();
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = Grid::for_result(&result(Some(prize.clone())), &table, &mut rng);

            prop_assert_eq!(grid.tiles().len(), GRID_TILES);
            prop_assert_eq!(grid.count(&prize.id), 3);
            for other in table.iter().filter(|p| p.id != prize.id) {
                prop_assert!(grid.count(&other.id) <= 2);
            }
        }

        #[test]
        fn losing_grids_never_show_three_of_a_kind(
            table_size in 0usize..12,
            seed in any::<u64>(),
        ) {
            let table = prizes(table_size);
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = Grid::for_result(&result(None), &table, &mut rng);

            prop_assert_eq!(grid.tiles().len(), GRID_TILES);
            prop_assert!(grid.winning_symbol().is_none());
        }
    }
}
