// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Theme palette
//!
//! The workbook theme (`xl/theme/theme1.xml`) defines 12 base colors. Styles
//! reference them by index, in an order where the first two pairs of dark and
//! light colors are swapped:
//!
//! | index | role |
//! |---|---|
//! | 0 | light1 |
//! | 1 | dark1 |
//! | 2 | light2 |
//! | 3 | dark2 |
//! | 4-9 | accent1 to accent6 |
//! | 10 | hyperlink |
//! | 11 | followed hyperlink |

use crate::color::Rgb;

/// Role of a theme color, in theme document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeRole {
    /// `dk1`, usually the window text color
    Dark1,
    /// `lt1`, usually the window background color
    Light1,
    /// `dk2`
    Dark2,
    /// `lt2`
    Light2,
    /// `accent1`
    Accent1,
    /// `accent2`
    Accent2,
    /// `accent3`
    Accent3,
    /// `accent4`
    Accent4,
    /// `accent5`
    Accent5,
    /// `accent6`
    Accent6,
    /// `hlink`
    Hyperlink,
    /// `folHlink`
    FollowedHyperlink,
}

impl ThemeRole {
    /// All roles in theme document order
    pub const ALL: [ThemeRole; 12] = [
        ThemeRole::Dark1,
        ThemeRole::Light1,
        ThemeRole::Dark2,
        ThemeRole::Light2,
        ThemeRole::Accent1,
        ThemeRole::Accent2,
        ThemeRole::Accent3,
        ThemeRole::Accent4,
        ThemeRole::Accent5,
        ThemeRole::Accent6,
        ThemeRole::Hyperlink,
        ThemeRole::FollowedHyperlink,
    ];

    /// Role of a color scheme child element (`dk1`, `accent3`, ...)
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        let role = match tag {
            b"dk1" => ThemeRole::Dark1,
            b"lt1" => ThemeRole::Light1,
            b"dk2" => ThemeRole::Dark2,
            b"lt2" => ThemeRole::Light2,
            b"accent1" => ThemeRole::Accent1,
            b"accent2" => ThemeRole::Accent2,
            b"accent3" => ThemeRole::Accent3,
            b"accent4" => ThemeRole::Accent4,
            b"accent5" => ThemeRole::Accent5,
            b"accent6" => ThemeRole::Accent6,
            b"hlink" => ThemeRole::Hyperlink,
            b"folHlink" => ThemeRole::FollowedHyperlink,
            _ => return None,
        };
        Some(role)
    }

    /// Role referenced by a style `theme="n"` attribute
    pub fn from_index(index: u32) -> Option<Self> {
        let role = match index {
            0 => ThemeRole::Light1,
            1 => ThemeRole::Dark1,
            2 => ThemeRole::Light2,
            3 => ThemeRole::Dark2,
            4..=11 => ThemeRole::ALL[index as usize],
            _ => return None,
        };
        Some(role)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// The base colors of a workbook theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeColors {
    colors: [Option<Rgb>; 12],
}

impl ThemeColors {
    /// A palette without any color
    pub fn empty() -> Self {
        ThemeColors { colors: [None; 12] }
    }

    /// The default Office palette, used when a workbook has no theme part
    pub fn office() -> Self {
        let mut theme = ThemeColors::empty();
        let office = [
            0x000000, 0xFFFFFF, 0x1F497D, 0xEEECE1, 0x4F81BD, 0xC0504D, 0x9BBB59, 0x8064A2,
            0x4BACC6, 0xF79646, 0x0000FF, 0x800080,
        ];
        for (role, c) in ThemeRole::ALL.iter().zip(office) {
            theme.set(*role, Rgb::from_u32(c));
        }
        theme
    }

    /// Sets the color of a role
    pub fn set(&mut self, role: ThemeRole, color: Rgb) {
        self.colors[role.slot()] = Some(color);
    }

    /// Gets the color of a role
    pub fn get(&self, role: ThemeRole) -> Option<Rgb> {
        self.colors[role.slot()]
    }

    /// Gets the color referenced by a style theme index
    pub fn by_index(&self, index: u32) -> Option<Rgb> {
        ThemeRole::from_index(index).and_then(|r| self.get(r))
    }

    /// Checks whether no color is defined
    pub fn is_empty(&self) -> bool {
        self.colors.iter().all(Option::is_none)
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        ThemeColors::office()
    }
}
