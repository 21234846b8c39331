use crate::error::ShelfError;

/// Folder ids come from the external taxonomy. `0` is the virtual root and never a real folder.
pub type FolderId = i64;

pub type DocumentId = i64;

/// Parse a comma-joined id list such as `"5, 3,8"`.
///
/// Empty segments are ignored, anything that is not an integer fails the whole list.
pub fn parse_id_list(input: &str) -> Result<Vec<i64>, ShelfError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| ShelfError::InvalidInput(format!("'{s}' is not an integer id")))
        })
        .collect()
}

pub fn join_id_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_joined_ids() {
        assert_eq!(vec![5, 3, 8], parse_id_list("5, 3,8").unwrap());
        assert_eq!(vec![1, 2], parse_id_list(",1,,2,").unwrap());
        assert!(parse_id_list("").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_integers() {
        let err = parse_id_list("1,two,3").unwrap_err();
        assert!(matches!(err, ShelfError::InvalidInput(_)));
        assert!(parse_id_list("1.5").is_err());
    }

    #[test]
    fn joins_ids() {
        assert_eq!("5,3,8", join_id_list(&[5, 3, 8]));
        assert_eq!("", join_id_list(&[]));
    }
}
