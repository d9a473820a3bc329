//! Object key naming for uploaded files

/// Names longer than this are shortened before upload
const MAX_NAME_CHARS: usize = 15;
/// Characters kept from each end of a shortened name
const KEPT_CHARS: usize = 5;

/// Shorten overlong names to `first5_last5`
pub fn shorten_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= MAX_NAME_CHARS {
        return name.to_string();
    }
    let head: String = chars[..KEPT_CHARS].iter().collect();
    let tail: String = chars[chars.len() - KEPT_CHARS..].iter().collect();
    format!("{head}_{tail}")
}

/// Insert `_<timestamp>` before the extension, or append it when there is none
pub fn timestamped_name(name: &str, timestamp_ms: i64) -> String {
    match name.rfind('.') {
        Some(dot) => format!("{}_{timestamp_ms}{}", &name[..dot], &name[dot..]),
        None => format!("{name}_{timestamp_ms}"),
    }
}

/// Key prefix for an upload; temporary files live under `/user/temp/`
pub fn key_prefix(upload_path: &str, temp: bool) -> String {
    if temp {
        upload_path.replacen("/user/", "/user/temp/", 1)
    } else {
        upload_path.to_string()
    }
}

/// Final object name for `name` uploaded at `timestamp_ms`
pub fn object_name(name: &str, timestamp_ms: i64) -> String {
    timestamped_name(&shorten_name(name), timestamp_ms)
}

/// Full object key: prefix followed by the final object name
pub fn object_key(upload_path: &str, name: &str, temp: bool, timestamp_ms: i64) -> String {
    format!(
        "{}{}",
        key_prefix(upload_path, temp),
        object_name(name, timestamp_ms)
    )
}

/// Milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names_are_kept() {
        assert_eq!(shorten_name("photo.png"), "photo.png");
        assert_eq!(shorten_name("exactly-15-char"), "exactly-15-char");
    }

    #[test]
    fn test_long_names_keep_both_ends() {
        assert_eq!(shorten_name("output-alpha-123456.png"), "outpu_6.png");
        assert_eq!(shorten_name("图片图片图片图片图片图片图片图片.jpg"), "图片图片图_片.jpg");
    }

    #[test]
    fn test_timestamp_goes_before_extension() {
        assert_eq!(timestamped_name("a.b.png", 17), "a.b_17.png");
        assert_eq!(timestamped_name("README", 17), "README_17");
    }

    #[test]
    fn test_temp_prefix() {
        assert_eq!(key_prefix("/user/42/", true), "/user/temp/42/");
        assert_eq!(key_prefix("/user/42/", false), "/user/42/");
        assert_eq!(key_prefix("/shared/", true), "/shared/");
    }

    #[test]
    fn test_object_key() {
        assert_eq!(
            object_key("/user/42/", "stencil-layer-000001.png", true, 1700000000000),
            "/user/temp/42/stenc_1_1700000000000.png"
        );
        assert_eq!(
            object_key("/user/42/", "cat.png", false, 5),
            "/user/42/cat_5.png"
        );
    }
}
