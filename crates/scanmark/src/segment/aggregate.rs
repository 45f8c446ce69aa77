use std::collections::HashMap;

use crate::roster::normalize_name;
use crate::segment::PAGE_SEPARATOR;

/// One page of OCR output, classified.
#[derive(Debug, Clone)]
pub struct PageResult {
    /// 1-based page number within the source document.
    pub number: u32,
    pub text: String,
    pub detected_name: Option<String>,
    pub continuation_name: Option<String>,
}

impl PageResult {
    /// A page with no header markers.
    pub fn body(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
            detected_name: None,
            continuation_name: None,
        }
    }
}

/// The reconstructed set of pages belonging to one student.
///
/// `start_page`/`end_page` track the min/max page number ever absorbed;
/// pages absorbed out of order (continuations) keep their absorption
/// order in `pages`, so the range need not be contiguous.
#[derive(Debug, Clone)]
pub struct Submission {
    pub student_label: String,
    pub start_page: u32,
    pub end_page: u32,
    pub pages: Vec<String>,
}

impl Submission {
    fn new(student_label: impl Into<String>, page_number: u32) -> Self {
        Self {
            student_label: student_label.into(),
            start_page: page_number,
            end_page: page_number,
            pages: Vec::new(),
        }
    }

    fn append_page(&mut self, text: &str, page_number: u32) {
        self.pages.push(text.to_string());
        if page_number < self.start_page {
            self.start_page = page_number;
        }
        if page_number > self.end_page {
            self.end_page = page_number;
        }
    }

    /// Width of the page-number range, inclusive.
    pub fn page_count(&self) -> u32 {
        self.end_page - self.start_page + 1
    }

    /// Flattens the pages to one blob with form-feed separators, the form
    /// the scrubber's per-page budgets expect.
    pub fn joined_text(&self) -> String {
        self.pages.join(&PAGE_SEPARATOR.to_string())
    }
}

fn unknown_label(prefix: &str, counter: u32) -> String {
    format!("{} {:02}", prefix, counter)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Folds an ordered page stream into per-student submissions. One pass.
///
/// Per-page priority: a continuation marker routes the page to the named
/// submission (or buffers it until that name appears) without disturbing
/// the open submission; a detected name always closes the open submission
/// and starts a new one; anything else extends the open submission or
/// starts an unknown-labeled one.
///
/// Submissions closed during the pass come first, in close order. Buffered
/// continuation pages whose target never appeared are materialized at the
/// end, grouped by target, in ascending order of each group's first page.
pub fn aggregate(pages: &[PageResult], unknown_prefix: &str) -> Vec<Submission> {
    // All submissions live in `slab`; `closed` records output order.
    // Index maps stand in for the shared references the algorithm needs:
    // a continuation may target the open submission or an already closed
    // one equally.
    let mut slab: Vec<Submission> = Vec::new();
    let mut closed: Vec<usize> = Vec::new();
    let mut current: Option<usize> = None;
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut pending: HashMap<String, Vec<&PageResult>> = HashMap::new();
    let mut unknown_counter: u32 = 0;

    for page in pages {
        if let Some(continuation) = non_empty(&page.continuation_name) {
            let key = normalize_name(continuation);
            if let Some(&target) = by_name.get(&key) {
                slab[target].append_page(&page.text, page.number);
            } else if !key.is_empty() {
                pending.entry(key).or_default().push(page);
            } else {
                // Marker present but no usable target name: fail open,
                // the page becomes its own unknown submission.
                unknown_counter += 1;
                let mut submission =
                    Submission::new(unknown_label(unknown_prefix, unknown_counter), page.number);
                submission.append_page(&page.text, page.number);
                closed.push(slab.len());
                slab.push(submission);
            }
            continue;
        }

        if let Some(name) = non_empty(&page.detected_name) {
            // Detected headers are authoritative boundaries.
            if let Some(open) = current.take() {
                closed.push(open);
            }
            let mut submission = Submission::new(name, page.number);
            submission.append_page(&page.text, page.number);
            let index = slab.len();
            slab.push(submission);
            current = Some(index);

            let key = normalize_name(name);
            if !key.is_empty() {
                by_name.insert(key.clone(), index);
                // Replay pages that arrived before their target, in page
                // order rather than arrival order.
                if let Some(mut buffered) = pending.remove(&key) {
                    buffered.sort_by_key(|p| p.number);
                    for buffered_page in buffered {
                        slab[index].append_page(&buffered_page.text, buffered_page.number);
                    }
                }
            }
            continue;
        }

        match current {
            Some(open) => slab[open].append_page(&page.text, page.number),
            None => {
                unknown_counter += 1;
                let mut submission =
                    Submission::new(unknown_label(unknown_prefix, unknown_counter), page.number);
                submission.append_page(&page.text, page.number);
                current = Some(slab.len());
                slab.push(submission);
            }
        }
    }

    if let Some(open) = current {
        closed.push(open);
    }

    // Continuations whose target name never showed up as a header.
    let mut leftovers: Vec<Vec<&PageResult>> = pending.into_values().collect();
    for group in leftovers.iter_mut() {
        group.sort_by_key(|p| p.number);
    }
    leftovers.sort_by_key(|group| group[0].number);

    for group in leftovers {
        let label = match non_empty(&group[0].continuation_name) {
            Some(name) => name.to_string(),
            None => {
                unknown_counter += 1;
                unknown_label(unknown_prefix, unknown_counter)
            }
        };
        let mut submission = Submission::new(label, group[0].number);
        for page in group {
            submission.append_page(&page.text, page.number);
        }
        closed.push(slab.len());
        slab.push(submission);
    }

    let mut slots: Vec<Option<Submission>> = slab.into_iter().map(Some).collect();
    closed
        .into_iter()
        .map(|index| slots[index].take().expect("each submission closed once"))
        .collect()
}
