use fp_schemas::{PaperSize, PrintSide, PrintType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pages::printed_pages;

/// Per-page rate table, in paise.
///
/// `*_price_paise` is what the customer pays per printed sheet side;
/// `*_cost_paise` is the shop's production cost per printed page and only
/// feeds the daily profit report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub bw_price_paise: i64,
    pub color_price_paise: i64,
    pub bw_cost_paise: i64,
    pub color_cost_paise: i64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            bw_price_paise: 300,
            color_price_paise: 1200,
            bw_cost_paise: 100,
            color_cost_paise: 500,
        }
    }
}

impl Pricing {
    pub fn rate(&self, print_type: PrintType) -> i64 {
        match print_type {
            PrintType::Bw => self.bw_price_paise,
            PrintType::Color => self.color_price_paise,
        }
    }

    pub fn cost(&self, print_type: PrintType) -> i64 {
        match print_type {
            PrintType::Bw => self.bw_cost_paise,
            PrintType::Color => self.color_cost_paise,
        }
    }
}

/// Sheets needed for one copy. Double-sided rounds up.
pub fn sheets(pages: u32, side: PrintSide) -> u32 {
    match side {
        PrintSide::Single => pages,
        PrintSide::Double => pages.div_ceil(2),
    }
}

/// `sheets * copies * rate`.
pub fn item_price(
    pages: u32,
    copies: u32,
    print_type: PrintType,
    side: PrintSide,
    pricing: &Pricing,
) -> i64 {
    i64::from(sheets(pages, side)) * i64::from(copies) * pricing.rate(print_type)
}

// ---------------------------------------------------------------------------
// Order quoting
// ---------------------------------------------------------------------------

/// Print options submitted alongside each uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOptions {
    pub page_count: u32,
    pub copies: u32,
    pub print_type: PrintType,
    pub paper_size: PaperSize,
    pub print_side: PrintSide,
    #[serde(default)]
    pub page_range: Option<String>,
}

/// One uploaded file as seen by validation.
#[derive(Debug, Clone, Copy)]
pub struct ItemDraft<'a> {
    pub file_name: &'a str,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
    pub options: &'a PrintOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLimits {
    pub max_copies: u32,
    /// Ceiling on the declared page count of one document.
    pub max_pages: u32,
}

impl Default for OrderLimits {
    fn default() -> Self {
        Self {
            max_copies: 100,
            max_pages: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderRejection {
    #[error("No files uploaded")]
    NoFiles,
    #[error("{file}: only PDF documents can be printed")]
    NotPdf { file: String },
    #[error("{file}: file is empty")]
    EmptyFile { file: String },
    #[error("{file}: page count must be at least 1")]
    NoPages { file: String },
    #[error("{file}: page count must be at most {max}")]
    TooManyPages { file: String, max: u32 },
    #[error("{file}: copies must be between 1 and {max}")]
    CopiesOutOfRange { file: String, max: u32 },
    #[error("{file}: page range '{range}' selects no pages")]
    EmptyPageRange { file: String, range: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedItem {
    pub file_name: String,
    pub options: PrintOptions,
    pub printed_pages: u32,
    pub price_paise: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuote {
    pub items: Vec<QuotedItem>,
    pub total_paise: i64,
}

const PDF_MAGIC: &[u8] = b"%PDF-";

fn looks_like_pdf(draft: &ItemDraft<'_>) -> bool {
    let named_pdf = draft.file_name.to_ascii_lowercase().ends_with(".pdf");
    let typed_pdf = draft
        .content_type
        .map(|ct| ct.eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false);
    (named_pdf || typed_pdf) && draft.data.starts_with(PDF_MAGIC)
}

/// Validate uploaded files and price every item.
///
/// Priced pages are the page-range selection when one is given, otherwise
/// the full page count.
pub fn quote_order(
    drafts: &[ItemDraft<'_>],
    pricing: &Pricing,
    limits: &OrderLimits,
) -> Result<OrderQuote, OrderRejection> {
    if drafts.is_empty() {
        return Err(OrderRejection::NoFiles);
    }

    let mut items = Vec::with_capacity(drafts.len());
    let mut total_paise = 0i64;

    for d in drafts {
        let file = d.file_name.to_string();
        if d.data.is_empty() {
            return Err(OrderRejection::EmptyFile { file });
        }
        if !looks_like_pdf(d) {
            return Err(OrderRejection::NotPdf { file });
        }

        let opts = d.options;
        if opts.page_count == 0 {
            return Err(OrderRejection::NoPages { file });
        }
        if opts.page_count > limits.max_pages {
            return Err(OrderRejection::TooManyPages {
                file,
                max: limits.max_pages,
            });
        }
        if opts.copies == 0 || opts.copies > limits.max_copies {
            return Err(OrderRejection::CopiesOutOfRange {
                file,
                max: limits.max_copies,
            });
        }

        let pages = printed_pages(opts.page_count, opts.page_range.as_deref());
        if pages == 0 {
            return Err(OrderRejection::EmptyPageRange {
                file,
                range: opts.page_range.clone().unwrap_or_default(),
            });
        }

        let price_paise = item_price(pages, opts.copies, opts.print_type, opts.print_side, pricing);
        total_paise += price_paise;
        items.push(QuotedItem {
            file_name: file,
            options: opts.clone(),
            printed_pages: pages,
            price_paise,
        });
    }

    Ok(OrderQuote { items, total_paise })
}
