use std::fmt;

use crate::error::{DbError, DbResult};

// ┌────────────────────────────────────────────────────────────┐
// │ Offset │ Length │ Description                              │
// │────────┼────────┼──────────────────────────────────────────│
// │   0    │   4    │ ID (u32, little-endian)                  │
// │   4    │  33    │ USERNAME (≤ 32 bytes, NUL padded)        │
// │  37    │ 256    │ EMAIL    (≤ 255 bytes, NUL padded)       │
// └────────────────────────────────────────────────────────────┘

pub const COLUMN_USERNAME_SIZE: usize = 32;
pub const COLUMN_EMAIL_SIZE: usize = 255;

pub const ID_SIZE: usize = 4;
pub const USERNAME_SIZE: usize = COLUMN_USERNAME_SIZE + 1;
pub const EMAIL_SIZE: usize = COLUMN_EMAIL_SIZE + 1;
pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A single record of the table. `id` doubles as the B+tree key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: u32,
    username: String,
    email: String,
}

impl Row {
    /// Build a row, rejecting text that would not survive the fixed-width layout.
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> DbResult<Row> {
        let username = username.into();
        let email = email.into();
        check_text("username", &username, COLUMN_USERNAME_SIZE)?;
        check_text("email", &email, COLUMN_EMAIL_SIZE)?;
        Ok(Row { id, username, email })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Write the row into `dest[..ROW_SIZE]`.
    pub fn serialize(&self, dest: &mut [u8]) {
        dest[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        write_text(&mut dest[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE], &self.username);
        write_text(&mut dest[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE], &self.email);
    }

    /// Read a row back from `src[..ROW_SIZE]`.
    pub fn deserialize(src: &[u8]) -> Row {
        let mut id_bytes = [0u8; ID_SIZE];
        id_bytes.copy_from_slice(&src[ID_OFFSET..ID_OFFSET + ID_SIZE]);
        Row {
            id: u32::from_le_bytes(id_bytes),
            username: read_text(&src[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]),
            email: read_text(&src[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

fn check_text(column: &'static str, value: &str, max: usize) -> DbResult<()> {
    if value.len() > max {
        return Err(DbError::StringTooLong { column, max });
    }
    if value.contains('\0') {
        return Err(DbError::InvalidValue(format!("{} contains a NUL byte", column)));
    }
    Ok(())
}

/// Copy `value` into `field`, keeping the last byte as a NUL terminator.
/// Text that does not fit is cut at the last whole character.
fn write_text(field: &mut [u8], value: &str) {
    field.fill(0);
    let mut len = value.len().min(field.len() - 1);
    while !value.is_char_boundary(len) {
        len -= 1;
    }
    field[..len].copy_from_slice(&value.as_bytes()[..len]);
}

fn read_text(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_fixed_offsets() {
        assert_eq!(ROW_SIZE, 293);
        assert_eq!(USERNAME_OFFSET, 4);
        assert_eq!(EMAIL_OFFSET, 37);
    }

    #[test]
    fn serialize_then_deserialize_returns_same_row() {
        let row = Row::new(42, "alice", "alice@example.com").unwrap();
        let mut buf = [0xffu8; ROW_SIZE];
        row.serialize(&mut buf);
        assert_eq!(Row::deserialize(&buf), row);
        assert_eq!(&buf[0..4], &42u32.to_le_bytes());
        assert_eq!(buf[USERNAME_OFFSET + 5], 0);
    }

    #[test]
    fn fields_at_maximum_length_round_trip() {
        let username = "u".repeat(COLUMN_USERNAME_SIZE);
        let email = "e".repeat(COLUMN_EMAIL_SIZE);
        let row = Row::new(u32::MAX, username.clone(), email.clone()).unwrap();
        let mut buf = [0u8; ROW_SIZE];
        row.serialize(&mut buf);
        let back = Row::deserialize(&buf);
        assert_eq!(back.username(), username);
        assert_eq!(back.email(), email);
        assert_eq!(buf[USERNAME_OFFSET + COLUMN_USERNAME_SIZE], 0);
        assert_eq!(buf[EMAIL_OFFSET + COLUMN_EMAIL_SIZE], 0);
    }

    #[test]
    fn overlong_text_is_rejected() {
        let err = Row::new(1, "u".repeat(33), "a@b").unwrap_err();
        assert!(matches!(err, DbError::StringTooLong { column: "username", max: 32 }));
        let err = Row::new(1, "a", "e".repeat(256)).unwrap_err();
        assert!(matches!(err, DbError::StringTooLong { column: "email", max: 255 }));
    }

    #[test]
    fn embedded_nul_is_rejected() {
        assert!(matches!(
            Row::new(1, "a\0b", "a@b"),
            Err(DbError::InvalidValue(_))
        ));
    }

    #[test]
    fn multibyte_text_counts_bytes() {
        // 11 three-byte characters = 33 bytes
        assert!(Row::new(1, "€".repeat(11), "x").is_err());
        let row = Row::new(1, "€".repeat(10), "x").unwrap();
        let mut buf = [0u8; ROW_SIZE];
        row.serialize(&mut buf);
        assert_eq!(Row::deserialize(&buf), row);
    }

    #[test]
    fn overflowing_text_is_cut_on_a_char_boundary() {
        // Four bytes of room: one three-byte character fits, the second does not.
        let mut field = [0xffu8; 5];
        write_text(&mut field, "€€");
        assert_eq!(&field[..3], "€".as_bytes());
        assert_eq!(&field[3..], &[0, 0]);
        assert_eq!(read_text(&field), "€");
    }

    #[test]
    fn lossy_decoded_row_serializes_as_valid_text() {
        // A username field with no terminator and invalid UTF-8 decodes to
        // replacement characters that are wider than the field.
        let mut buf = [0u8; ROW_SIZE];
        buf[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE].fill(0xff);
        let decoded = Row::deserialize(&buf);
        assert!(decoded.username().len() > COLUMN_USERNAME_SIZE);

        let mut again = [0u8; ROW_SIZE];
        decoded.serialize(&mut again);
        let field = &again[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE];
        let end = field.iter().position(|&b| b == 0).unwrap();
        assert!(std::str::from_utf8(&field[..end]).is_ok());
        assert_eq!(end, 30);
    }

    #[test]
    fn accessors_expose_validated_fields() {
        let row = Row::new(9, "carol", "carol@example.com").unwrap();
        assert_eq!(row.id(), 9);
        assert_eq!(row.username(), "carol");
        assert_eq!(row.email(), "carol@example.com");
    }

    #[test]
    fn display_matches_select_output() {
        let row = Row::new(7, "bob", "bob@example.com").unwrap();
        assert_eq!(row.to_string(), "(7, bob, bob@example.com)");
    }
}
