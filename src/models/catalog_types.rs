use serde::Serialize;
use std::path::PathBuf;

/// Ground-truth label, fixed by the directory a sample was scanned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Fake,
    Real,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Fake, Category::Real];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Fake => "Fake",
            Category::Real => "Real",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Fake => "fake",
            Category::Real => "real",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleDescriptor {
    full_path: PathBuf,
    relative_url: String,
    category: Category,
}

impl SampleDescriptor {
    pub fn new(full_path: PathBuf, relative_url: String, category: Category) -> Self {
        Self {
            full_path,
            relative_url,
            category,
        }
    }

    pub fn full_path(&self) -> &PathBuf {
        &self.full_path
    }

    pub fn relative_url(&self) -> &str {
        &self.relative_url
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_fake_category(&self) -> bool {
        self.category == Category::Fake
    }
}

/// One shuffled snapshot of the corpus. Never mutated after it is published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    samples: Vec<SampleDescriptor>,
}

impl Catalog {
    pub fn new(samples: Vec<SampleDescriptor>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[SampleDescriptor] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<SampleDescriptor>,
    pub page_number: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_items: usize,
}

/// Outcome of a page lookup that did not fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum PageLookup {
    Found(Page),
    /// The requested page is past the end; callers navigate to `last_page`.
    OutOfRange { last_page: usize },
}
