// Positions of everything in the processed spreadsheets.
//
// All the positions are 0-based. The comments give the Excel names.

use survey_scoring::*;

use crate::report::config_reader::ReportStyle;
use crate::report::io_common::cell_name;
use crate::report::sheet::*;
use crate::report::*;

/// Row 23: the header of the question table.
pub const HEADER_ROW: RowNum = 22;
/// Row 24: the first question.
pub const FIRST_DATA_ROW: RowNum = 23;
/// D23: empty in a fresh export, holds the `Question Order` header once processed.
pub const GUARD_CELL: (RowNum, ColNum) = (HEADER_ROW, COL_ORDER);

pub const COL_LABEL: ColNum = 0;
pub const COL_DIFFICULTY: ColNum = 1;
pub const COL_SCORE: ColNum = 2;
pub const COL_ORDER: ColNum = 3;
pub const COL_CATEGORY1: ColNum = 4;
pub const COL_CATEGORY2: ColNum = 5;
pub const COL_CATEGORY3: ColNum = 6;

const ORDER_HEADER: &str = "Question Order";
const CATEGORY1_HEADER: &str = "1st Order Category";
const CATEGORY2_HEADER: &str = "2nd Order Category";
const CATEGORY3_HEADER: &str = "3rd Order Category";
const AVERAGE_HEADER: &str = "Avg. Score (%)";
const OVERALL_HEADER: &str = "Overall Average";
const NO_AVERAGE: &str = "n/a";

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BlockKind {
    Level1,
    Level2,
    /// The Leader / Team breakdown.
    Level3,
    Overall,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct BlockAnchor {
    pub kind: BlockKind,
    /// Top-left cell of the block (its title row).
    pub row: RowNum,
    pub col: ColNum,
}

/// Where the summary blocks of a template go, and how wide the columns are.
#[derive(PartialEq, Debug, Clone)]
pub struct LayoutDescriptor {
    pub kind: TemplateKind,
    /// Number of questions in the data block.
    pub data_rows: u32,
    /// Rows inserted after the data block to hold the summary blocks.
    pub inserted_rows: u32,
    pub blocks: &'static [BlockAnchor],
    /// Widths from column A onwards.
    pub column_widths: &'static [f64],
}

impl LayoutDescriptor {
    /// The first row after the questions.
    pub fn data_end(&self) -> RowNum {
        FIRST_DATA_ROW + self.data_rows
    }

    pub fn category_columns(&self) -> &'static [(ColNum, &'static str)] {
        if self.kind.has_third_level() {
            &[
                (COL_ORDER, ORDER_HEADER),
                (COL_CATEGORY1, CATEGORY1_HEADER),
                (COL_CATEGORY2, CATEGORY2_HEADER),
                (COL_CATEGORY3, CATEGORY3_HEADER),
            ]
        } else {
            &[
                (COL_ORDER, ORDER_HEADER),
                (COL_CATEGORY1, CATEGORY1_HEADER),
                (COL_CATEGORY2, CATEGORY2_HEADER),
            ]
        }
    }
}

// Review: questions on rows 24-61, blocks from row 63.
const REVIEW_BLOCK_ROW: RowNum = 62;
const REVIEW_BLOCKS: [BlockAnchor; 3] = [
    BlockAnchor {
        kind: BlockKind::Level1,
        row: REVIEW_BLOCK_ROW,
        col: 0,
    },
    BlockAnchor {
        kind: BlockKind::Level2,
        row: REVIEW_BLOCK_ROW,
        col: 3,
    },
    BlockAnchor {
        kind: BlockKind::Overall,
        row: REVIEW_BLOCK_ROW,
        col: 6,
    },
];

// NoLeader: questions on rows 24-70, blocks from row 72.
const NO_LEADER_BLOCK_ROW: RowNum = 71;
const NO_LEADER_BLOCKS: [BlockAnchor; 3] = [
    BlockAnchor {
        kind: BlockKind::Level1,
        row: NO_LEADER_BLOCK_ROW,
        col: 0,
    },
    BlockAnchor {
        kind: BlockKind::Level2,
        row: NO_LEADER_BLOCK_ROW,
        col: 3,
    },
    BlockAnchor {
        kind: BlockKind::Overall,
        row: NO_LEADER_BLOCK_ROW,
        col: 6,
    },
];

// Leader and Team: questions on rows 24-103, blocks from row 105.
const LEADER_TEAM_BLOCK_ROW: RowNum = 104;
const LEADER_TEAM_BLOCKS: [BlockAnchor; 4] = [
    BlockAnchor {
        kind: BlockKind::Level1,
        row: LEADER_TEAM_BLOCK_ROW,
        col: 0,
    },
    BlockAnchor {
        kind: BlockKind::Level2,
        row: LEADER_TEAM_BLOCK_ROW,
        col: 3,
    },
    BlockAnchor {
        kind: BlockKind::Level3,
        row: LEADER_TEAM_BLOCK_ROW,
        col: 6,
    },
    BlockAnchor {
        kind: BlockKind::Overall,
        row: LEADER_TEAM_BLOCK_ROW,
        col: 10,
    },
];

const TWO_LEVEL_WIDTHS: [f64; 8] = [70.0, 12.0, 16.0, 20.0, 22.0, 22.0, 18.0, 10.0];
const THREE_LEVEL_WIDTHS: [f64; 12] = [
    70.0, 12.0, 16.0, 20.0, 22.0, 22.0, 22.0, 12.0, 12.0, 4.0, 18.0, 10.0,
];

pub const REVIEW_LAYOUT: LayoutDescriptor = LayoutDescriptor {
    kind: TemplateKind::Review,
    data_rows: 38,
    inserted_rows: 10,
    blocks: &REVIEW_BLOCKS,
    column_widths: &TWO_LEVEL_WIDTHS,
};

pub const NO_LEADER_LAYOUT: LayoutDescriptor = LayoutDescriptor {
    kind: TemplateKind::NoLeader,
    data_rows: 47,
    inserted_rows: 12,
    blocks: &NO_LEADER_BLOCKS,
    column_widths: &TWO_LEVEL_WIDTHS,
};

pub const LEADER_LAYOUT: LayoutDescriptor = LayoutDescriptor {
    kind: TemplateKind::Leader,
    data_rows: 80,
    inserted_rows: 13,
    blocks: &LEADER_TEAM_BLOCKS,
    column_widths: &THREE_LEVEL_WIDTHS,
};

pub const TEAM_LAYOUT: LayoutDescriptor = LayoutDescriptor {
    kind: TemplateKind::Team,
    data_rows: 80,
    inserted_rows: 13,
    blocks: &LEADER_TEAM_BLOCKS,
    column_widths: &THREE_LEVEL_WIDTHS,
};

pub fn layout(kind: TemplateKind) -> &'static LayoutDescriptor {
    match kind {
        TemplateKind::Review => &REVIEW_LAYOUT,
        TemplateKind::NoLeader => &NO_LEADER_LAYOUT,
        TemplateKind::Leader => &LEADER_LAYOUT,
        TemplateKind::Team => &TEAM_LAYOUT,
    }
}

/// Number of rows taken by a block, title included.
pub fn block_height(kind: BlockKind, template: TemplateKind) -> u32 {
    let d = descriptor(template);
    let distinct = |cats: Vec<Category2>| {
        let mut cats = cats;
        cats.dedup();
        cats.len() as u32
    };
    match kind {
        BlockKind::Level1 => 1 + d.level1.len() as u32,
        BlockKind::Level2 => 1 + distinct(d.level2.iter().map(|(c, _)| *c).collect()),
        BlockKind::Level3 => {
            1 + distinct(
                d.level2
                    .iter()
                    .map(|(c, _)| *c)
                    .filter(|c| *c != Category2::Health)
                    .collect(),
            )
        }
        BlockKind::Overall => 1,
    }
}

fn check_not_processed(name: &str, grid: &SheetGrid) -> ReportResult<()> {
    let (row, col) = GUARD_CELL;
    if !grid.is_blank(row, col) {
        return AlreadyProcessedSnafu {
            name,
            cell: cell_name(row, col),
        }
        .fail();
    }
    Ok(())
}

/// Number of consecutive questions from the first data row.
fn source_data_rows(grid: &SheetGrid) -> u32 {
    let mut n = 0;
    while !grid.is_blank(FIRST_DATA_ROW + n, COL_LABEL) {
        n += 1;
    }
    n
}

fn raw_score(cell: Option<&CellValue>) -> RawScore {
    match cell {
        None => RawScore::Missing,
        Some(v) if v.is_blank() => RawScore::Missing,
        Some(CellValue::Number(f)) => RawScore::Number(*f),
        Some(v) => RawScore::Text(v.as_text()),
    }
}

/// Reads the questions of an export.
///
/// Fails if the export was already processed: the guard cell is checked
/// before anything else.
pub fn extract_table(name: &str, grid: &SheetGrid) -> ReportResult<QuestionTable> {
    check_not_processed(name, grid)?;
    if grid.is_blank(HEADER_ROW, COL_LABEL) {
        return MissingHeaderRowSnafu {
            name,
            row: HEADER_ROW + 1,
        }
        .fail();
    }

    let mut builder = builder::Builder::new();
    for row in FIRST_DATA_ROW..FIRST_DATA_ROW + source_data_rows(grid) {
        let label = grid
            .get(row, COL_LABEL)
            .map(|v| v.as_text())
            .unwrap_or_default();
        let difficulty = grid
            .get(row, COL_DIFFICULTY)
            .map(|v| v.as_text())
            .unwrap_or_default();
        let score = raw_score(grid.get(row, COL_SCORE));
        debug!(
            "extract_table: {}: row {}: {:?} {:?} {:?}",
            name,
            row + 1,
            label,
            difficulty,
            score
        );
        builder
            .add_row(&label, &difficulty, &score)
            .context(ScoringSnafu { name })?;
    }
    let table = builder.build().context(ScoringSnafu { name })?;
    info!("extract_table: {}: {} questions", name, table.len());
    Ok(table)
}

/// Renders the processed version of an export.
///
/// The content above the question table is kept as is, the questions are
/// written back in question order with their categories, the summary blocks
/// are written in rows inserted after the questions, and whatever followed
/// the questions is moved down below them.
pub fn render(
    name: &str,
    rows: &[CategorizedRow],
    summaries: &Summaries,
    kind: TemplateKind,
    source: &SheetGrid,
    style: &ReportStyle,
) -> ReportResult<RenderedSheet> {
    let lay = layout(kind);

    let mut grid = source.clone();
    let unmerged = grid.unmerge_all();
    if unmerged > 0 {
        debug!("render: {}: removed {} merged regions", name, unmerged);
    }
    check_not_processed(name, &grid)?;

    let src_rows = source_data_rows(&grid);
    if src_rows as usize != rows.len() || rows.len() != lay.data_rows as usize {
        whatever!(
            "{}: {} questions in the sheet, {} categorized, the {} layout holds {}",
            name,
            src_rows,
            rows.len(),
            kind.name(),
            lay.data_rows
        )
    }

    let mut out = RenderedSheet::new(&grid.name);
    let src_end = FIRST_DATA_ROW + src_rows;
    let mut dropped = 0;
    for ((row, col), value) in grid.cells.iter() {
        let (row, col) = (*row, *col);
        if row < HEADER_ROW {
            out.put(row, col, value.clone(), CellStyle::Body);
        } else if row == HEADER_ROW {
            // Only the headers of the export are kept, anything at their right is stale.
            if col < COL_ORDER {
                out.put(row, col, value.clone(), CellStyle::Header);
            } else {
                debug!("render: {}: stale header {} dropped", name, cell_name(row, col));
            }
        } else if row < src_end {
            if col > COL_SCORE {
                dropped += 1;
            }
        } else {
            out.put(row + lay.inserted_rows, col, value.clone(), CellStyle::Body);
        }
    }
    if dropped > 0 {
        warn!(
            "render: {}: {} cell(s) at the right of the questions were dropped",
            name, dropped
        );
    }

    for (col, header) in lay.category_columns() {
        out.put_text(HEADER_ROW, *col, header, CellStyle::Header);
    }
    write_questions(&mut out, rows);

    for block in lay.blocks {
        match block.kind {
            BlockKind::Level1 => write_summary(
                &mut out,
                block,
                CATEGORY1_HEADER,
                summaries
                    .level1
                    .entries
                    .iter()
                    .map(|(k, v)| (k.label(), *v)),
            ),
            BlockKind::Level2 => write_summary(
                &mut out,
                block,
                CATEGORY2_HEADER,
                summaries
                    .level2
                    .entries
                    .iter()
                    .map(|(k, v)| (k.label(), *v)),
            ),
            BlockKind::Level3 => {
                if let Some(l3) = summaries.level3.as_ref() {
                    write_breakdown(&mut out, block, l3);
                }
            }
            BlockKind::Overall => {
                out.put_text(block.row, block.col, OVERALL_HEADER, CellStyle::BlockHeader);
                out.put(
                    block.row,
                    block.col + 1,
                    CellValue::Number(summaries.overall),
                    CellStyle::Average,
                );
            }
        }
    }

    out.column_widths = lay
        .column_widths
        .iter()
        .enumerate()
        .map(|(col, w)| (col as ColNum, *w))
        .collect();
    out.row_heights.push((HEADER_ROW, style.header_row_height));
    for row in FIRST_DATA_ROW..lay.data_end() + lay.inserted_rows {
        out.row_heights.push((row, style.row_height));
    }

    info!(
        "render: {}: {} questions, {} rows inserted at row {}",
        name,
        rows.len(),
        lay.inserted_rows,
        lay.data_end() + 1
    );
    Ok(out)
}

fn write_questions(out: &mut RenderedSheet, rows: &[CategorizedRow]) {
    for (idx, r) in rows.iter().enumerate() {
        let row = FIRST_DATA_ROW + idx as RowNum;
        out.put_text(row, COL_LABEL, &r.row.label, CellStyle::Body);
        out.put_text(row, COL_DIFFICULTY, &r.row.difficulty, CellStyle::Body);
        out.put_text(row, COL_SCORE, &format!("{}%", r.row.score), CellStyle::Body);
        out.put(
            row,
            COL_ORDER,
            CellValue::Number(r.question_order as f64),
            CellStyle::Body,
        );
        out.put_text(row, COL_CATEGORY1, r.category1.label(), CellStyle::Body);
        out.put_text(row, COL_CATEGORY2, r.category2.label(), CellStyle::Body);
        if let Some(c3) = r.category3 {
            out.put_text(row, COL_CATEGORY3, c3.label(), CellStyle::Body);
        }
    }
}

fn put_average(out: &mut RenderedSheet, row: RowNum, col: ColNum, avg: Option<f64>) {
    match avg {
        Some(x) => out.put(row, col, CellValue::Number(x), CellStyle::Average),
        None => out.put_text(row, col, NO_AVERAGE, CellStyle::Body),
    }
}

fn write_summary<'a, I>(out: &mut RenderedSheet, block: &BlockAnchor, title: &str, entries: I)
where
    I: Iterator<Item = (&'a str, Option<f64>)>,
{
    out.put_text(block.row, block.col, title, CellStyle::BlockHeader);
    out.put_text(block.row, block.col + 1, AVERAGE_HEADER, CellStyle::BlockHeader);
    for (idx, (label, avg)) in entries.enumerate() {
        let row = block.row + 1 + idx as RowNum;
        out.put_text(row, block.col, label, CellStyle::Body);
        put_average(out, row, block.col + 1, avg);
    }
}

// One line per 2nd order category, with the leader and the team averages side by side.
fn write_breakdown(
    out: &mut RenderedSheet,
    block: &BlockAnchor,
    l3: &CategorySummary<(Category2, Category3)>,
) {
    out.put_text(block.row, block.col, CATEGORY2_HEADER, CellStyle::BlockHeader);
    out.put_text(
        block.row,
        block.col + 1,
        Category3::Leader.label(),
        CellStyle::BlockHeader,
    );
    out.put_text(
        block.row,
        block.col + 2,
        Category3::Team.label(),
        CellStyle::BlockHeader,
    );
    let mut categories: Vec<Category2> = l3.entries.iter().map(|((c2, _), _)| *c2).collect();
    categories.dedup();
    for (idx, c2) in categories.iter().enumerate() {
        let row = block.row + 1 + idx as RowNum;
        out.put_text(row, block.col, c2.label(), CellStyle::Body);
        put_average(out, row, block.col + 1, l3.get(&(*c2, Category3::Leader)));
        put_average(out, row, block.col + 2, l3.get(&(*c2, Category3::Team)));
    }
}
