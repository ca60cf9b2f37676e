//! Constants for targeting modes, parameter keys and message fragments.

/// Targeting type literal that enables host selection on an invocation.
///
/// Any other value (or no value at all) leaves the invocation without
/// targeting, which is then reported by validation at save time.
///
/// # Examples
///
/// ```
/// use invocation_composer::constants::STATIC_QUERY_TARGETING;
///
/// assert_eq!(STATIC_QUERY_TARGETING, "static_query");
/// ```
pub const STATIC_QUERY_TARGETING: &str = "static_query";

/// Description format used when neither the request nor the configuration
/// supplies one.
pub const DEFAULT_DESCRIPTION_FORMAT: &str = "%{template_name}";

/// Placeholder replaced by the invocation's job name in description formats.
pub const JOB_NAME_PLACEHOLDER: &str = "job_name";

/// Placeholder replaced by the first bound template's name.
pub const TEMPLATE_NAME_PLACEHOLDER: &str = "template_name";

/// Default upper bound on the length of an ad-hoc search query.
pub const DEFAULT_MAX_SEARCH_QUERY_LENGTH: usize = 4096;

/// Prefix for environment variables read by
/// [`ComposerConfig::from_env`](crate::config::ComposerConfig::from_env).
pub const ENV_PREFIX: &str = "INVOCATION_COMPOSER_";

/// Suffix shared by every blank-value validation message.
pub(crate) const BLANK: &str = "can't be blank";
