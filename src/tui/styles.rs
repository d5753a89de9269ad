//! Clinic colour palette and styles.
//!
//! Teal accents on a slate background, with semantic colours reserved for
//! visit status and diagnosis probability.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::{ProbabilityBand, VisitStatus};

/// Name shown in the header bar
pub const APP_NAME: &str = "ClinicDesk";

/// Clinic theme color palette.
pub struct ClinicTheme;

impl ClinicTheme {
    /// Accent teal
    pub const ACCENT: Color = Color::Rgb(13, 148, 136); // #0D9488
    pub const ACCENT_LIGHT: Color = Color::Rgb(94, 234, 212); // #5EEAD4
    pub const ACCENT_DARK: Color = Color::Rgb(17, 94, 89); // #115E59

    pub const OK: Color = Color::Rgb(34, 197, 94); // #22C55E
    pub const CAUTION: Color = Color::Rgb(245, 158, 11); // #F59E0B
    pub const ALERT: Color = Color::Rgb(239, 68, 68); // #EF4444
    pub const NOTE: Color = Color::Rgb(56, 189, 248); // #38BDF8

    pub const SURFACE: Color = Color::Rgb(30, 41, 59); // #1E293B
    pub const INK: Color = Color::Rgb(241, 245, 249); // #F1F5F9
    pub const INK_DIM: Color = Color::Rgb(203, 213, 225); // #CBD5E1
    pub const INK_FAINT: Color = Color::Rgb(113, 128, 150); // #718096
    pub const RULE: Color = Color::Rgb(71, 85, 105); // #475569

    fn fg(color: Color) -> Style {
        Style::default().fg(color)
    }

    fn strong(color: Color) -> Style {
        Self::fg(color).add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn title() -> Style {
        Self::strong(Self::INK)
    }

    /// Section headings inside panels
    #[must_use]
    pub fn subtitle() -> Style {
        Self::strong(Self::ACCENT_LIGHT)
    }

    #[must_use]
    pub fn text() -> Style {
        Self::fg(Self::INK)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Self::fg(Self::INK_DIM)
    }

    #[must_use]
    pub fn text_muted() -> Style {
        Self::fg(Self::INK_FAINT)
    }

    #[must_use]
    pub fn success() -> Style {
        Self::fg(Self::OK)
    }

    #[must_use]
    pub fn warning() -> Style {
        Self::fg(Self::CAUTION)
    }

    #[must_use]
    pub fn danger() -> Style {
        Self::fg(Self::ALERT)
    }

    #[must_use]
    pub fn info() -> Style {
        Self::fg(Self::NOTE)
    }

    /// Highlighted table row
    #[must_use]
    pub fn selected() -> Style {
        Self::strong(Self::SURFACE).bg(Self::ACCENT_LIGHT)
    }

    /// Form field being edited
    #[must_use]
    pub fn focused() -> Style {
        Self::strong(Self::ACCENT_LIGHT).add_modifier(Modifier::UNDERLINED)
    }

    #[must_use]
    pub fn border() -> Style {
        Self::fg(Self::RULE)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Self::fg(Self::ACCENT)
    }

    /// Table header and top bar
    #[must_use]
    pub fn header() -> Style {
        Self::strong(Self::INK).bg(Self::ACCENT_DARK)
    }

    #[must_use]
    pub fn key_hint() -> Style {
        Self::strong(Self::ACCENT)
    }

    #[must_use]
    pub fn key_desc() -> Style {
        Self::text_secondary()
    }

    #[must_use]
    pub fn cursor() -> Style {
        Self::fg(Self::ACCENT_LIGHT).add_modifier(Modifier::SLOW_BLINK)
    }

    /// Colour of a diagnosis suggestion by probability band
    #[must_use]
    pub fn band(band: ProbabilityBand) -> Style {
        match band {
            ProbabilityBand::High => Self::danger(),
            ProbabilityBand::Elevated => Self::warning(),
            ProbabilityBand::Low => Self::success(),
        }
    }

    #[must_use]
    pub fn status(status: VisitStatus) -> Style {
        match status {
            VisitStatus::Completed => Self::success(),
            VisitStatus::InProgress => Self::warning(),
            VisitStatus::Pending => Self::text_secondary(),
            VisitStatus::Other => Self::info(),
        }
    }
}
