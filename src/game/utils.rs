use chess::{Board, Color, Piece, ALL_SQUARES};

/// Convert a chess color to a string
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// Capitalised side name, as shown in the game-over modal.
pub fn side_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Render remaining clock time as `MM:SS`, flooring to whole seconds.
pub fn format_clock(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[derive(Default)]
struct Material {
    pawns: u32,
    knights: u32,
    bishops: u32,
    rooks: u32,
    queens: u32,
    // Square parity of the bishops, for the same-coloured bishops draw.
    bishop_on_even: bool,
    bishop_on_odd: bool,
}

impl Material {
    fn bare_king(&self) -> bool {
        self.minors() == 0 && self.pawns == 0 && self.rooks == 0 && self.queens == 0
    }

    fn minors(&self) -> u32 {
        self.knights + self.bishops
    }

    fn single_minor(&self) -> bool {
        self.minors() == 1 && self.pawns == 0 && self.rooks == 0 && self.queens == 0
    }

    fn lone_bishop(&self) -> bool {
        self.single_minor() && self.bishops == 1
    }
}

/// Check if the board has insufficient material for checkmate
pub fn has_insufficient_material(board: &Board) -> bool {
    let mut white = Material::default();
    let mut black = Material::default();

    for square in ALL_SQUARES {
        let (Some(piece), Some(color)) = (board.piece_on(square), board.color_on(square)) else {
            continue;
        };
        let side = match color {
            Color::White => &mut white,
            Color::Black => &mut black,
        };
        match piece {
            Piece::Pawn => side.pawns += 1,
            Piece::Knight => side.knights += 1,
            Piece::Bishop => {
                side.bishops += 1;
                if (square.get_rank().to_index() + square.get_file().to_index()) % 2 == 0 {
                    side.bishop_on_even = true;
                } else {
                    side.bishop_on_odd = true;
                }
            }
            Piece::Rook => side.rooks += 1,
            Piece::Queen => side.queens += 1,
            Piece::King => {}
        }
    }

    // King vs King, King and minor vs King
    if (white.bare_king() && (black.bare_king() || black.single_minor()))
        || (black.bare_king() && white.single_minor())
    {
        return true;
    }

    // King and Bishop vs King and Bishop, bishops on the same colour
    white.lone_bishop()
        && black.lone_bishop()
        && ((white.bishop_on_even && black.bishop_on_even)
            || (white.bishop_on_odd && black.bishop_on_odd))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).expect("valid FEN")
    }

    #[test]
    fn format_clock_pads_and_floors() {
        assert_eq!(format_clock(300_000), "05:00");
        assert_eq!(format_clock(61_999), "01:01");
        assert_eq!(format_clock(999), "00:00");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(20 * 60 * 1000), "20:00");
    }

    #[test]
    fn bare_kings_are_insufficient() {
        assert!(has_insufficient_material(&board("4k3/8/8/8/8/8/8/4K3 w - - 0 1")));
    }

    #[test]
    fn single_minor_is_insufficient() {
        assert!(has_insufficient_material(&board("4k3/8/8/8/8/8/8/3NK3 w - - 0 1")));
        assert!(has_insufficient_material(&board("3bk3/8/8/8/8/8/8/4K3 w - - 0 1")));
    }

    #[test]
    fn same_coloured_bishops_are_insufficient() {
        // c1 and f8 are both dark squares
        assert!(has_insufficient_material(&board("5b1k/8/8/8/8/8/8/2B4K w - - 0 1")));
        // c1 dark, c8 light
        assert!(!has_insufficient_material(&board("2b4k/8/8/8/8/8/8/2B4K w - - 0 1")));
    }

    #[test]
    fn rook_pawn_or_queen_is_sufficient() {
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1")));
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1")));
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/8/3QK3 w - - 0 1")));
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/8/2NNK3 w - - 0 1")));
    }

    #[test]
    fn start_position_is_sufficient() {
        assert!(!has_insufficient_material(&Board::default()));
    }
}
