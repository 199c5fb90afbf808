//! Presentation styles for exported sheets.
//!
//! All formats are created exactly once per export call and reused for
//! every cell; creating a format per cell exhausts the workbook's format
//! slots on large exports.

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder};

const BORDER_GRAY: Color = Color::RGB(0x80_80_80);

/// The fixed set of named formats one export session uses.
pub(crate) struct SheetStyles {
    pub title: Format,
    pub header: Format,
    pub data: Format,
    pub data_left: Format,
    pub data_center: Format,
    pub data_right: Format,
    pub total: Format,
}

impl SheetStyles {
    pub(crate) fn build() -> Self {
        let title = Format::new()
            .set_font_name("Arial")
            .set_font_size(16)
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);

        let data = Format::new()
            .set_font_name("Arial")
            .set_font_size(10)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(BORDER_GRAY);

        let header = data
            .clone()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(BORDER_GRAY)
            .set_align(FormatAlign::Center);

        let total = Format::new()
            .set_font_name("Arial")
            .set_font_size(10)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);

        Self {
            title,
            header,
            data_left: data.clone().set_align(FormatAlign::Left),
            data_center: data.clone().set_align(FormatAlign::Center),
            data_right: data.clone().set_align(FormatAlign::Right),
            data,
            total,
        }
    }

    /// Alignment variant for a data cell.
    pub(crate) fn data_for(&self, align: crate::schema::Align) -> &Format {
        match align {
            crate::schema::Align::General => &self.data,
            crate::schema::Align::Left => &self.data_left,
            crate::schema::Align::Center => &self.data_center,
            crate::schema::Align::Right => &self.data_right,
        }
    }
}
