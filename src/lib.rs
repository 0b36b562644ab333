//! Crate root module declarations for the Coda Chess engine.
//!
//! Exposes the board model, legal move generation, evaluation and search,
//! the UCI front-end and the text format helpers under stable module paths.

pub mod chess_errors;

pub mod game_state {
    pub mod arbiter;
    pub mod board;
    pub mod chess_rules;
    pub mod chess_types;
    pub mod game_state;
    pub mod piece_list;
}

pub mod moves {
    pub mod bit_utils;
    pub mod leaper_attacks;
    pub mod move_descriptions;
    pub mod ray_masks;
    pub mod slider_attacks;
}

pub mod move_generation {
    pub mod legal_move_generator;
    pub mod perft;
}

pub mod search {
    pub mod board_scoring;
    pub mod evaluation_masks;
    pub mod move_ordering;
    pub mod piece_square_tables;
    pub mod repetition_table;
    pub mod searcher;
    pub mod threading;
    pub mod transposition_table;
    pub mod zobrist;
}

pub mod uci {
    pub mod uci_top;
}

pub mod utils {
    pub mod algebraic;
    pub mod fen_generator;
    pub mod fen_parser;
    pub mod long_algebraic;
    pub mod render_game_state;
}
