use crate::error::{Error, Result};

const INT_SIZE: usize = std::mem::size_of::<i32>();
const LEN_SIZE: usize = std::mem::size_of::<u32>();

/// The in-memory contents of one disk block.
///
/// A page is always exactly `block_size` bytes long. Integers are stored
/// big-endian, byte arrays and strings carry a 4-byte length prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    data: Vec<u8>,
}

impl Page {
    /// Allocate a zero-filled page of `block_size` bytes.
    pub fn new(block_size: usize) -> Self {
        Page { data: vec![0; block_size] }
    }

    /// Maximum number of bytes a string of `strlen` characters can take.
    pub fn max_length(strlen: usize) -> usize {
        LEN_SIZE + strlen * 4
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    pub fn contents_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn get_int(&self, offset: usize) -> Result<i32> {
        let bytes = self.range(offset, INT_SIZE)?;
        Ok(i32::from_be_bytes(bytes.try_into()?))
    }

    pub fn set_int(&mut self, offset: usize, val: i32) -> Result<()> {
        self.range_mut(offset, INT_SIZE)?.copy_from_slice(&val.to_be_bytes());
        Ok(())
    }

    pub fn get_bytes(&self, offset: usize) -> Result<Vec<u8>> {
        let len = u32::from_be_bytes(self.range(offset, LEN_SIZE)?.try_into()?) as usize;
        Ok(self.range(offset + LEN_SIZE, len)?.to_vec())
    }

    pub fn set_bytes(&mut self, offset: usize, val: &[u8]) -> Result<()> {
        let len = u32::try_from(val.len())
            .map_err(|e| Error::Value(format!("byte array too long: {}", e)))?;
        // check the whole span first so a failed write leaves the page untouched
        self.range(offset, LEN_SIZE + val.len())?;
        self.range_mut(offset, LEN_SIZE)?.copy_from_slice(&len.to_be_bytes());
        self.range_mut(offset + LEN_SIZE, val.len())?.copy_from_slice(val);
        Ok(())
    }

    pub fn get_string(&self, offset: usize) -> Result<String> {
        Ok(String::from_utf8(self.get_bytes(offset)?)?)
    }

    pub fn set_string(&mut self, offset: usize, val: &str) -> Result<()> {
        self.set_bytes(offset, val.as_bytes())
    }

    fn range(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = self.check(offset, len)?;
        Ok(&self.data[offset..end])
    }

    fn range_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let end = self.check(offset, len)?;
        Ok(&mut self.data[offset..end])
    }

    fn check(&self, offset: usize, len: usize) -> Result<usize> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(end),
            _ => Err(Error::Value(format!(
                "page access out of range: offset {} len {} page size {}",
                offset,
                len,
                self.data.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_values() -> Result<()> {
        let mut page = Page::new(64);
        page.set_int(0, -42)?;
        page.set_string(4, "hello")?;
        page.set_int(60, 7)?;

        assert_eq!(-42, page.get_int(0)?);
        assert_eq!("hello", page.get_string(4)?);
        assert_eq!(7, page.get_int(60)?);
        assert_eq!(64, page.size());

        page.clear();
        assert_eq!(0, page.get_int(0)?);
        assert_eq!("", page.get_string(4)?);
        Ok(())
    }

    #[test]
    fn test_page_out_of_range() -> Result<()> {
        let mut page = Page::new(16);
        assert!(matches!(page.set_int(13, 1), Err(Error::Value(_))));
        assert!(matches!(page.get_int(usize::MAX), Err(Error::Value(_))));

        page.set_int(0, 9)?;
        // 4 bytes of length plus 13 bytes of payload does not fit
        assert!(page.set_bytes(0, &[1; 13]).is_err());
        assert_eq!(9, page.get_int(0)?);
        Ok(())
    }
}
