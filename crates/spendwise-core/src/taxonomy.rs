//! Static category taxonomy
//!
//! The taxonomy is closed and versioned: categories, their subcategories, the
//! keyword list used for text matching and the known merchant aliases used for
//! exact merchant lookup. Users cannot edit it; custom rules and corrections
//! must point at one of these labels.

use std::sync::LazyLock;

use regex::Regex;

pub const FALLBACK_CATEGORY: &str = "Other";
pub const FALLBACK_SUBCATEGORY: &str = "General";

/// Bump when categories, keywords or merchants change
pub const TAXONOMY_VERSION: u32 = 3;

/// A category in the taxonomy
#[derive(Debug)]
pub struct Category {
    pub name: &'static str,
    /// Ordered; the first entry is the default subcategory
    pub subcategories: &'static [&'static str],
    /// (keyword, subcategory) - matched as whole words against merchant + description
    pub keywords: &'static [(&'static str, &'static str)],
    /// (merchant alias, subcategory) - matched exactly after normalization
    pub merchants: &'static [(&'static str, &'static str)],
    /// Baseline weight applied to keyword/merchant matches for this category
    pub confidence: f64,
}

impl Category {
    pub fn has_subcategory(&self, subcategory: &str) -> bool {
        self.subcategories
            .iter()
            .any(|s| s.eq_ignore_ascii_case(subcategory))
    }

    pub fn default_subcategory(&self) -> &'static str {
        self.subcategories.first().copied().unwrap_or(FALLBACK_SUBCATEGORY)
    }
}

static CATEGORIES: &[Category] = &[
    Category {
        name: "Food & Dining",
        subcategories: &["Restaurants", "Fast Food", "Coffee & Tea", "Groceries", "Delivery", "Bars"],
        keywords: &[
            ("coffee", "Coffee & Tea"),
            ("espresso", "Coffee & Tea"),
            ("latte", "Coffee & Tea"),
            ("cafe", "Coffee & Tea"),
            ("tea house", "Coffee & Tea"),
            ("grocery", "Groceries"),
            ("groceries", "Groceries"),
            ("supermarket", "Groceries"),
            ("market", "Groceries"),
            ("burger", "Fast Food"),
            ("pizza", "Fast Food"),
            ("taco", "Fast Food"),
            ("drive thru", "Fast Food"),
            ("restaurant", "Restaurants"),
            ("grill", "Restaurants"),
            ("bistro", "Restaurants"),
            ("diner", "Restaurants"),
            ("sushi", "Restaurants"),
            ("delivery", "Delivery"),
            ("brewery", "Bars"),
            ("pub", "Bars"),
        ],
        merchants: &[
            ("starbucks", "Coffee & Tea"),
            ("dunkin", "Coffee & Tea"),
            ("peets coffee", "Coffee & Tea"),
            ("tim hortons", "Coffee & Tea"),
            ("mcdonalds", "Fast Food"),
            ("burger king", "Fast Food"),
            ("wendys", "Fast Food"),
            ("taco bell", "Fast Food"),
            ("chipotle", "Fast Food"),
            ("subway", "Fast Food"),
            ("chick fil a", "Fast Food"),
            ("whole foods", "Groceries"),
            ("trader joes", "Groceries"),
            ("safeway", "Groceries"),
            ("kroger", "Groceries"),
            ("aldi", "Groceries"),
            ("doordash", "Delivery"),
            ("uber eats", "Delivery"),
            ("grubhub", "Delivery"),
            ("olive garden", "Restaurants"),
            ("cheesecake factory", "Restaurants"),
        ],
        confidence: 0.9,
    },
    Category {
        name: "Transportation",
        subcategories: &["Gas & Fuel", "Rideshare", "Public Transit", "Parking", "Auto Service"],
        keywords: &[
            ("fuel", "Gas & Fuel"),
            ("gas station", "Gas & Fuel"),
            ("gasoline", "Gas & Fuel"),
            ("rideshare", "Rideshare"),
            ("taxi", "Rideshare"),
            ("transit", "Public Transit"),
            ("metro", "Public Transit"),
            ("subway fare", "Public Transit"),
            ("parking", "Parking"),
            ("toll", "Parking"),
            ("oil change", "Auto Service"),
            ("tire", "Auto Service"),
            ("auto repair", "Auto Service"),
        ],
        merchants: &[
            ("shell", "Gas & Fuel"),
            ("chevron", "Gas & Fuel"),
            ("exxon", "Gas & Fuel"),
            ("exxonmobil", "Gas & Fuel"),
            ("bp", "Gas & Fuel"),
            ("arco", "Gas & Fuel"),
            ("uber", "Rideshare"),
            ("lyft", "Rideshare"),
            ("jiffy lube", "Auto Service"),
            ("spothero", "Parking"),
        ],
        confidence: 0.9,
    },
    Category {
        name: "Shopping",
        subcategories: &["General Merchandise", "Clothing", "Electronics", "Home & Garden", "Online"],
        keywords: &[
            ("clothing", "Clothing"),
            ("apparel", "Clothing"),
            ("shoes", "Clothing"),
            ("electronics", "Electronics"),
            ("computer", "Electronics"),
            ("hardware", "Home & Garden"),
            ("garden", "Home & Garden"),
            ("home improvement", "Home & Garden"),
            ("department store", "General Merchandise"),
            ("marketplace", "Online"),
            ("online order", "Online"),
        ],
        merchants: &[
            ("amazon", "Online"),
            ("amazon com", "Online"),
            ("amzn mktp us", "Online"),
            ("ebay", "Online"),
            ("etsy", "Online"),
            ("target", "General Merchandise"),
            ("walmart", "General Merchandise"),
            ("costco", "General Merchandise"),
            ("best buy", "Electronics"),
            ("apple store", "Electronics"),
            ("home depot", "Home & Garden"),
            ("lowes", "Home & Garden"),
            ("ikea", "Home & Garden"),
            ("nike", "Clothing"),
            ("old navy", "Clothing"),
            ("h&m", "Clothing"),
        ],
        confidence: 0.85,
    },
    Category {
        name: "Entertainment",
        subcategories: &["Streaming", "Movies & Events", "Games", "Music", "Books"],
        keywords: &[
            ("streaming", "Streaming"),
            ("cinema", "Movies & Events"),
            ("theater", "Movies & Events"),
            ("theatre", "Movies & Events"),
            ("tickets", "Movies & Events"),
            ("concert", "Movies & Events"),
            ("game", "Games"),
            ("gaming", "Games"),
            ("bookstore", "Books"),
        ],
        merchants: &[
            ("netflix", "Streaming"),
            ("hulu", "Streaming"),
            ("disney plus", "Streaming"),
            ("hbo max", "Streaming"),
            ("spotify", "Music"),
            ("apple music", "Music"),
            ("steam", "Games"),
            ("playstation network", "Games"),
            ("amc theatres", "Movies & Events"),
            ("ticketmaster", "Movies & Events"),
            ("barnes & noble", "Books"),
        ],
        confidence: 0.9,
    },
    Category {
        name: "Bills & Utilities",
        subcategories: &["Electric", "Internet", "Phone", "Water", "Insurance"],
        keywords: &[
            ("electric", "Electric"),
            ("power company", "Electric"),
            ("internet", "Internet"),
            ("broadband", "Internet"),
            ("wireless", "Phone"),
            ("mobile plan", "Phone"),
            ("water bill", "Water"),
            ("utility", "Electric"),
            ("insurance", "Insurance"),
        ],
        merchants: &[
            ("comcast", "Internet"),
            ("xfinity", "Internet"),
            ("spectrum", "Internet"),
            ("verizon", "Phone"),
            ("at&t", "Phone"),
            ("t mobile", "Phone"),
            ("pg&e", "Electric"),
            ("geico", "Insurance"),
            ("state farm", "Insurance"),
            ("progressive", "Insurance"),
        ],
        confidence: 0.9,
    },
    Category {
        name: "Health & Fitness",
        subcategories: &["Pharmacy", "Doctor", "Gym", "Dental", "Vision"],
        keywords: &[
            ("pharmacy", "Pharmacy"),
            ("drugstore", "Pharmacy"),
            ("clinic", "Doctor"),
            ("medical", "Doctor"),
            ("hospital", "Doctor"),
            ("gym", "Gym"),
            ("fitness", "Gym"),
            ("yoga", "Gym"),
            ("dental", "Dental"),
            ("dentist", "Dental"),
            ("optometry", "Vision"),
        ],
        merchants: &[
            ("cvs", "Pharmacy"),
            ("cvs pharmacy", "Pharmacy"),
            ("walgreens", "Pharmacy"),
            ("rite aid", "Pharmacy"),
            ("planet fitness", "Gym"),
            ("equinox", "Gym"),
            ("peloton", "Gym"),
        ],
        confidence: 0.85,
    },
    Category {
        name: "Travel",
        subcategories: &["Airfare", "Hotel", "Car Rental", "Vacation"],
        keywords: &[
            ("airline", "Airfare"),
            ("airlines", "Airfare"),
            ("flight", "Airfare"),
            ("hotel", "Hotel"),
            ("motel", "Hotel"),
            ("resort", "Vacation"),
            ("car rental", "Car Rental"),
        ],
        merchants: &[
            ("delta", "Airfare"),
            ("united airlines", "Airfare"),
            ("southwest", "Airfare"),
            ("american airlines", "Airfare"),
            ("marriott", "Hotel"),
            ("hilton", "Hotel"),
            ("airbnb", "Vacation"),
            ("expedia", "Vacation"),
            ("hertz", "Car Rental"),
            ("enterprise rent a car", "Car Rental"),
        ],
        confidence: 0.9,
    },
    Category {
        name: "Housing",
        subcategories: &["Rent", "Mortgage", "Furniture", "Maintenance"],
        keywords: &[
            ("rent", "Rent"),
            ("mortgage", "Mortgage"),
            ("furniture", "Furniture"),
            ("mattress", "Furniture"),
            ("plumbing", "Maintenance"),
            ("hoa", "Maintenance"),
        ],
        merchants: &[
            ("wayfair", "Furniture"),
            ("ashley furniture", "Furniture"),
            ("rooms to go", "Furniture"),
        ],
        confidence: 0.85,
    },
    Category {
        name: "Personal Care",
        subcategories: &["Hair & Beauty", "Spa", "Laundry"],
        keywords: &[
            ("salon", "Hair & Beauty"),
            ("barber", "Hair & Beauty"),
            ("cosmetics", "Hair & Beauty"),
            ("spa", "Spa"),
            ("massage", "Spa"),
            ("laundromat", "Laundry"),
            ("dry cleaning", "Laundry"),
        ],
        merchants: &[
            ("sephora", "Hair & Beauty"),
            ("ulta", "Hair & Beauty"),
            ("great clips", "Hair & Beauty"),
        ],
        confidence: 0.85,
    },
    Category {
        name: "Education",
        subcategories: &["Tuition", "Books & Supplies", "Courses"],
        keywords: &[
            ("tuition", "Tuition"),
            ("university", "Tuition"),
            ("college", "Tuition"),
            ("textbook", "Books & Supplies"),
            ("course", "Courses"),
            ("online class", "Courses"),
        ],
        merchants: &[
            ("coursera", "Courses"),
            ("udemy", "Courses"),
            ("chegg", "Books & Supplies"),
        ],
        confidence: 0.85,
    },
    Category {
        name: FALLBACK_CATEGORY,
        subcategories: &[FALLBACK_SUBCATEGORY],
        keywords: &[],
        merchants: &[],
        confidence: 0.1,
    },
];

/// Processor prefixes banks put in front of merchant names ("SQ *", "TST* ")
static PROCESSOR_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(sq|tst|pp|paypal|sp|dd|py)\s*\*\s*").expect("valid regex")
});

/// Store numbers ("#1234") and long digit groups (terminal/location ids)
static STORE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\s*\d+|\b\d{3,}\b").expect("valid regex"));

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9& ]+").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize a merchant name for comparison
///
/// "SQ *BLUE BOTTLE #0042" → "blue bottle", "McDonald's" → "mcdonalds"
pub fn normalize_merchant(merchant: &str) -> String {
    let lower = merchant.trim().to_lowercase().replace(['\'', '’'], "");
    let without_prefix = PROCESSOR_PREFIX.replace(&lower, "");
    let without_numbers = STORE_NUMBER.replace_all(&without_prefix, " ");
    let cleaned = NON_WORD.replace_all(&without_numbers, " ");
    WHITESPACE.replace_all(&cleaned, " ").trim().to_string()
}

/// True if `needle` occurs in `haystack` bounded by non-alphanumeric characters
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let bytes = haystack.as_bytes();
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let after_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        before_ok && after_ok
    })
}

/// A keyword or merchant hit in the taxonomy
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyMatch {
    pub category: &'static str,
    pub subcategory: &'static str,
    pub matched: &'static str,
}

/// The versioned category reference data
#[derive(Debug, Clone, Copy)]
pub struct Taxonomy {
    version: u32,
    categories: &'static [Category],
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::standard()
    }
}

impl Taxonomy {
    /// The built-in taxonomy
    pub fn standard() -> Self {
        Self {
            version: TAXONOMY_VERSION,
            categories: CATEGORIES,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn categories(&self) -> &'static [Category] {
        self.categories
    }

    /// Find a category by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&'static Category> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Whether the category/subcategory pair exists
    pub fn is_valid(&self, category: &str, subcategory: &str) -> bool {
        self.find(category)
            .map(|c| c.has_subcategory(subcategory))
            .unwrap_or(false)
    }

    /// First keyword hit in taxonomy order
    pub fn keyword_match(&self, text: &str) -> Option<TaxonomyMatch> {
        let text = text.to_lowercase();
        for category in self.categories {
            for &(keyword, subcategory) in category.keywords {
                if contains_word(&text, keyword) {
                    return Some(TaxonomyMatch {
                        category: category.name,
                        subcategory,
                        matched: keyword,
                    });
                }
            }
        }
        None
    }

    /// Merchant lookup against known aliases
    ///
    /// An exact (normalized) alias wins; otherwise the longest alias that
    /// forms the leading words of the merchant, so "NETFLIX.COM" and
    /// "SHELL OIL 5521" resolve like "netflix" and "shell".
    pub fn merchant_lookup(&self, merchant: &str) -> Option<TaxonomyMatch> {
        let key = normalize_merchant(merchant);
        if key.is_empty() {
            return None;
        }

        let mut leading: Option<(usize, TaxonomyMatch)> = None;
        for category in self.categories {
            for &(alias, subcategory) in category.merchants {
                let alias_key = normalize_merchant(alias);
                let hit = TaxonomyMatch {
                    category: category.name,
                    subcategory,
                    matched: alias,
                };
                if alias_key == key {
                    return Some(hit);
                }
                let is_prefix = key
                    .strip_prefix(alias_key.as_str())
                    .is_some_and(|rest| rest.starts_with(' '));
                if is_prefix && leading.as_ref().map_or(true, |(len, _)| alias_key.len() > *len) {
                    leading = Some((alias_key.len(), hit));
                }
            }
        }
        leading.map(|(_, hit)| hit)
    }
}
