use crate::error::{Error, Result};
use crate::listener::Listener;

const HOOK_PREFIX: &str = "on_";
const HOOK_SUFFIX: &str = "_finished";

/// Static description of a subject type: its observable methods and the
/// subject type it extends.
///
/// One schema exists per companion listener trait. It is produced by
/// [`listenable!`](crate::listenable) and reached through [`Companion`].
#[derive(Debug)]
pub struct SubjectSchema {
    /// Module-qualified name of the companion listener trait
    pub name: &'static str,
    /// Schema of the parent subject type, `None` only for the root
    pub parent: Option<&'static SubjectSchema>,
    /// Observable methods declared directly on this subject type
    pub methods: &'static [&'static str],
}

impl SubjectSchema {
    /// The trait name without its module path
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    /// This schema followed by each of its ancestors, root last
    pub fn ancestry(&self) -> impl Iterator<Item = &SubjectSchema> + '_ {
        std::iter::successors(Some(self), |schema| schema.parent)
    }

    /// Whether a listener for this schema also satisfies `other`
    pub fn is_a(&self, other: &SubjectSchema) -> bool {
        self.ancestry().any(|schema| schema.name == other.name)
    }

    /// Whether `method` is declared observable directly on this subject type
    pub fn declares(&self, method: &str) -> bool {
        self.methods.contains(&method)
    }

    /// Hook pairs for the methods declared directly on this subject type
    pub fn hooks(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.methods
            .iter()
            .map(|method| (pre_hook_name(method), post_hook_name(method)))
    }

    /// Whether `hook` belongs to an observable method anywhere in the ancestry
    pub fn recognizes(&self, hook: &str) -> bool {
        self.ancestry()
            .flat_map(|schema| schema.methods.iter())
            .any(|method| is_hook_of(method, hook))
    }
}

/// Implemented for every companion listener trait object (`dyn FooListener`).
///
/// Kept apart from the listener traits themselves so they stay object safe.
pub trait Companion: 'static {
    const SCHEMA: &'static SubjectSchema;
}

/// Name of the hook invoked before `method` runs
pub fn pre_hook_name(method: &str) -> String {
    format!("{HOOK_PREFIX}{method}")
}

/// Name of the hook invoked after `method` returns
pub fn post_hook_name(method: &str) -> String {
    format!("{HOOK_PREFIX}{method}{HOOK_SUFFIX}")
}

fn is_hook_of(method: &str, hook: &str) -> bool {
    let Some(rest) = hook.strip_prefix(HOOK_PREFIX) else {
        return false;
    };
    rest == method || rest.strip_suffix(HOOK_SUFFIX) == Some(method)
}

/// Compile-time check that `pre` and `post` follow the hook naming rule for
/// `method`. Used by `listenable!` in a `const` assertion.
pub const fn derives(method: &str, pre: &str, post: &str) -> bool {
    let (prefix, suffix) = (HOOK_PREFIX.as_bytes(), HOOK_SUFFIX.as_bytes());
    let (method, pre, post) = (method.as_bytes(), pre.as_bytes(), post.as_bytes());

    pre.len() == prefix.len() + method.len()
        && post.len() == prefix.len() + method.len() + suffix.len()
        && matches_at(pre, prefix, 0)
        && matches_at(pre, method, prefix.len())
        && matches_at(post, prefix, 0)
        && matches_at(post, method, prefix.len())
        && matches_at(post, suffix, prefix.len() + method.len())
}

const fn matches_at(haystack: &[u8], needle: &[u8], offset: usize) -> bool {
    if offset + needle.len() > haystack.len() {
        return false;
    }
    let mut i = 0;
    while i < needle.len() {
        if haystack[offset + i] != needle[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Check every hook name against the union of the targets' ancestries.
///
/// The reserved attach/detach hooks are always in scope.
pub fn validate<'a, I>(listener: &str, hooks: I, targets: &[&'static SubjectSchema]) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let root = <dyn Listener as Companion>::SCHEMA;
    for hook in hooks {
        let known = root.recognizes(hook) || targets.iter().any(|target| target.recognizes(hook));
        if !known {
            return Err(Error::UnknownHook {
                listener: listener.to_string(),
                hook: hook.to_string(),
            });
        }
    }
    Ok(())
}
