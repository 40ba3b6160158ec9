//! URL key derivation.
//!
//! Keys are built per language: a binding's localized display name is
//! slugified, collisions inside the batch are numbered in batch order, the
//! product code is appended, and the final key is checked once more against
//! every key already taken in that language.

use std::collections::{BTreeMap, HashMap, HashSet};

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use storefront_catalog::LanguageCode;

use crate::model::{ProductBindingId, Slug};
use crate::settings::SlugSettings;

/// Lowercase, strip diacritics, turn every run of other characters into one `-`.
///
/// Letters and digits outside ASCII survive (lowercased); only combining marks
/// are dropped after canonical decomposition.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.nfkd().filter(|c| !is_combining_mark(*c)) {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// One binding waiting for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugRequest {
    pub binding: ProductBindingId,
    pub language: LanguageCode,
    /// Display name resolved in `language`.
    pub name: String,
    pub default_code: Option<String>,
    /// Key the binding holds today, if any.
    pub current: Option<String>,
}

/// Batch slug generator.
#[derive(Debug, Clone)]
pub struct SlugGenerator<'a> {
    settings: &'a SlugSettings,
}

impl<'a> SlugGenerator<'a> {
    pub fn new(settings: &'a SlugSettings) -> Self {
        Self { settings }
    }

    /// Assign a key to every request.
    ///
    /// `reserved` holds keys already used per language by bindings outside the
    /// batch. A request whose `current` key is still one its name could produce
    /// keeps it; the remaining requests are then numbered in the order given.
    pub fn generate(
        &self,
        requests: &[SlugRequest],
        reserved: &HashMap<LanguageCode, HashSet<String>>,
    ) -> HashMap<ProductBindingId, Slug> {
        let mut by_language: BTreeMap<&LanguageCode, Vec<&SlugRequest>> = BTreeMap::new();
        for request in requests {
            by_language.entry(&request.language).or_default().push(request);
        }

        let mut out = HashMap::with_capacity(requests.len());
        for (language, group) in by_language {
            let mut bases_taken = HashSet::new();
            let mut keys_taken = reserved.get(language).cloned().unwrap_or_default();
            let planned: Vec<(&SlugRequest, String, Option<String>)> = group
                .into_iter()
                .map(|request| (request, self.base_slug(request), self.code_suffix(request)))
                .collect();

            let mut pending = Vec::with_capacity(planned.len());
            for (request, base, code) in &planned {
                let held = request.current.as_deref().and_then(|current| {
                    let stem = self.held_stem(base, code.as_deref(), current)?;
                    (!bases_taken.contains(&stem) && !keys_taken.contains(current))
                        .then(|| (stem, current.to_string()))
                });
                match held {
                    Some((stem, key)) => {
                        bases_taken.insert(stem);
                        keys_taken.insert(key.clone());
                        out.insert(request.binding, Slug::from_key(key));
                    }
                    None => pending.push((*request, base, code)),
                }
            }

            for (request, base, code) in pending {
                let base = self.claim(base.clone(), &mut bases_taken);
                let key = match code {
                    Some(code) => format!("{base}{}{code}", self.settings.separator),
                    None => base,
                };
                let key = self.claim(key, &mut keys_taken);

                tracing::debug!(
                    binding_id = %request.binding,
                    language = %language,
                    slug = %key,
                    "slug computed"
                );
                out.insert(request.binding, Slug::from_key(key));
            }
        }
        out
    }

    /// Base stem behind `current` if `current` is a key `base` and `code`
    /// could have produced, collision numbering included.
    fn held_stem(&self, base: &str, code: Option<&str>, current: &str) -> Option<String> {
        let stem = match code {
            Some(code) => {
                let tail = format!("{}{code}", self.settings.separator);
                current
                    .strip_suffix(tail.as_str())
                    .or_else(|| self.strip_number(current)?.strip_suffix(tail.as_str()))?
            }
            None => current,
        };
        (stem == base || self.strip_number(stem) == Some(base)).then(|| stem.to_string())
    }

    /// `key` without a trailing collision number, if it carries one.
    fn strip_number<'k>(&self, key: &'k str) -> Option<&'k str> {
        let (head, n) = key.rsplit_once(self.settings.separator.as_str())?;
        let n: u32 = n.parse().ok()?;
        (n >= self.settings.first_collision_suffix && !head.is_empty()).then_some(head)
    }

    fn base_slug(&self, request: &SlugRequest) -> String {
        let base = slugify(&request.name);
        if !base.is_empty() {
            return base;
        }
        tracing::warn!(
            binding_id = %request.binding,
            name = %request.name,
            placeholder = %self.settings.placeholder,
            "display name yields no slug, using placeholder"
        );
        let placeholder = slugify(&self.settings.placeholder);
        if placeholder.is_empty() {
            "product".to_string()
        } else {
            placeholder
        }
    }

    fn code_suffix(&self, request: &SlugRequest) -> Option<String> {
        if !self.settings.append_default_code {
            return None;
        }
        request
            .default_code
            .as_deref()
            .map(slugify)
            .filter(|code| !code.is_empty())
    }

    /// First free key among `candidate`, `candidate-N`, `candidate-N+1`, ...
    fn claim(&self, candidate: String, taken: &mut HashSet<String>) -> String {
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        let mut n = self.settings.first_collision_suffix;
        loop {
            let numbered = format!("{candidate}{}{n}", self.settings.separator);
            if taken.insert(numbered.clone()) {
                return numbered;
            }
            n += 1;
        }
    }
}
