//! Header row normalization.

use std::collections::HashMap;
use std::fmt;

/// Product attribute a spreadsheet column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportField {
    Name,
    Strength,
    ExpireDate,
    Price,
    StockQuantity,
    DosageForm,
}

impl ImportField {
    /// Fields every row must carry, in the order they are reported.
    pub const REQUIRED: [ImportField; 5] = [
        ImportField::Name,
        ImportField::Strength,
        ImportField::Price,
        ImportField::StockQuantity,
        ImportField::DosageForm,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ImportField::Name => "name",
            ImportField::Strength => "strength",
            ImportField::ExpireDate => "expire_date",
            ImportField::Price => "price",
            ImportField::StockQuantity => "stock_quantity",
            ImportField::DosageForm => "dosage_form_id",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            ImportField::Name => &["name", "product name", "product_name"],
            ImportField::Strength => &["strength", "dose"],
            ImportField::ExpireDate => &[
                "expire_date",
                "expiry",
                "expire date",
                "expiry date",
                "expiration date",
            ],
            ImportField::Price => &["price", "cost", "unit price"],
            ImportField::StockQuantity => &[
                "stock_quantity",
                "stock quantity",
                "quantity",
                "stock",
                "stock qty",
            ],
            ImportField::DosageForm => &["dosage_form_id", "dosage", "dosage form", "form"],
        }
    }

    const ALL: [ImportField; 6] = [
        ImportField::Name,
        ImportField::Strength,
        ImportField::ExpireDate,
        ImportField::Price,
        ImportField::StockQuantity,
        ImportField::DosageForm,
    ];

    /// Matches a raw header cell against the alias table.
    pub fn from_header(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|field| field.aliases().contains(&normalized.as_str()))
    }
}

impl fmt::Display for ImportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Column index for every recognised field. The first matching column wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: HashMap<ImportField, usize>,
}

impl HeaderMap {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut columns = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(field) = ImportField::from_header(header.as_ref()) {
                columns.entry(field).or_insert(idx);
            }
        }
        Self { columns }
    }

    pub fn column(&self, field: ImportField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
