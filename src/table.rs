//! Fixed-width table rendering with ANSI-aware cell measurement.
//!
//! Cells may carry color escapes; widths are computed from the visible
//! text so styled columns still line up.

use console::measure_text_width;

/// Column width policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// Exactly this many visible characters.
    Fixed(usize),
    /// Widest cell (or the title) plus padding.
    Max,
}

/// One column: a title, a width policy, and a cell selector.
pub struct Column<T> {
    pub title: &'static str,
    pub width: Width,
    select: Box<dyn Fn(&T) -> String>,
}

impl<T> Column<T> {
    pub fn new(title: &'static str, width: Width, select: impl Fn(&T) -> String + 'static) -> Self {
        Self {
            title,
            width,
            select: Box::new(select),
        }
    }
}

/// Render items as rows under a header line.
pub fn render<T>(columns: &[Column<T>], items: &[T]) -> String {
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| columns.iter().map(|column| (column.select)(item)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| match column.width {
            Width::Fixed(width) => width,
            Width::Max => {
                rows.iter()
                    .map(|row| measure_text_width(&row[index]))
                    .chain([column.title.len()])
                    .max()
                    .unwrap_or(0)
                    + 2
            }
        })
        .collect();

    let mut out = String::new();
    for (column, width) in columns.iter().zip(&widths) {
        push_cell(&mut out, column.title, *width);
    }
    out.push('\n');
    for row in &rows {
        for (cell, width) in row.iter().zip(&widths) {
            push_cell(&mut out, cell, *width);
        }
        out.push('\n');
    }
    out
}

fn push_cell(out: &mut String, text: &str, width: usize) {
    out.push_str(text);
    let visible = measure_text_width(text);
    // An overlong cell keeps a single separating space rather than being
    // truncated mid-escape-sequence.
    let padding = width.saturating_sub(visible).max(1);
    out.extend(std::iter::repeat_n(' ', padding));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        name: &'static str,
        count: usize,
    }

    fn columns() -> Vec<Column<Row>> {
        vec![
            Column::new("name", Width::Max, |row: &Row| row.name.to_string()),
            Column::new("count", Width::Max, |row: &Row| row.count.to_string()),
        ]
    }

    #[test]
    fn columns_line_up_across_rows() {
        let rows = vec![
            Row { name: "a", count: 1 },
            Row { name: "longer-name", count: 22 },
        ];
        let rendered = render(&columns(), &rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);

        let count_positions: Vec<usize> = lines
            .iter()
            .map(|line| line.find(|c: char| c.is_ascii_digit() || c == 'c').unwrap())
            .collect();
        assert!(count_positions.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn max_width_ignores_ansi_escapes() {
        let columns = vec![
            Column::new("styled", Width::Max, |row: &Row| {
                format!("\u{1b}[31m{}\u{1b}[0m", row.name)
            }),
            Column::new("count", Width::Max, |row: &Row| row.count.to_string()),
        ];
        let rows = vec![Row { name: "ab", count: 7 }];
        let rendered = render(&columns, &rows);
        let header = rendered.lines().next().unwrap();
        let body = rendered.lines().nth(1).unwrap();

        // "styled" (6 visible) is wider than "ab" (2 visible), so both
        // lines place the second column at the same visible offset.
        assert_eq!(measure_text_width(header), measure_text_width(body));
    }

    #[test]
    fn fixed_width_is_respected() {
        let columns = vec![Column::new("name", Width::Fixed(10), |row: &Row| {
            row.name.to_string()
        })];
        let rows = vec![Row { name: "ab", count: 0 }];
        let rendered = render(&columns, &rows);
        let body = rendered.lines().nth(1).unwrap();
        assert_eq!(body.len(), 10);
    }

    #[test]
    fn no_rows_renders_just_the_header() {
        let rendered = render(&columns(), &[]);
        assert_eq!(rendered.lines().count(), 1);
        assert!(rendered.starts_with("name"));
    }
}
