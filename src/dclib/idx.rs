use crate::dclib::{check_shapes, Error, Image, Result, UNKNOWN_LABEL};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const IMAGE_MAGIC: u32 = 2051;
pub const LABEL_MAGIC: u32 = 2049;

/// Source and destination of the image working set
pub trait ImageStore {
    fn load_items(&self) -> Result<Vec<Image>>;
    fn load_labels(&self) -> Result<Vec<u8>>;
    fn store(&self, images: &[Image], with_labels: bool) -> Result<()>;
}

/// A pair of IDX files: `<images>` (magic 2051) and `<labels>` (magic 2049)
#[derive(Debug, Clone)]
pub struct IdxStore {
    pub images: PathBuf,
    pub labels: PathBuf,
}

impl IdxStore {
    pub fn new(images: &Path, labels: &Path) -> Self {
        Self {
            images: images.to_path_buf(),
            labels: labels.to_path_buf(),
        }
    }

    /// Images with their ground-truth labels attached
    pub fn load_labeled(&self) -> Result<Vec<Image>> {
        let mut items = self.load_items()?;
        let labels = self.load_labels()?;
        crate::dclib::apply_labels(&mut items, &labels)?;
        Ok(items)
    }
}

impl ImageStore for IdxStore {
    fn load_items(&self) -> Result<Vec<Image>> {
        read_images(&mut BufReader::new(File::open(&self.images)?))
    }

    fn load_labels(&self) -> Result<Vec<u8>> {
        read_labels(&mut BufReader::new(File::open(&self.labels)?))
    }

    fn store(&self, images: &[Image], with_labels: bool) -> Result<()> {
        let mut out = BufWriter::new(File::create(&self.images)?);
        write_images(&mut out, images)?;
        out.flush()?;
        if with_labels {
            let mut out = BufWriter::new(File::create(&self.labels)?);
            write_labels(&mut out, images)?;
            out.flush()?;
        }
        Ok(())
    }
}

/// Largest image accepted from a file, in pixels
const MAX_PIXELS: usize = 1 << 24;
/// Most items reserved up front from a header count
const PREALLOC_LIMIT: usize = 1 << 16;

fn read_u32<R: Read>(input: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read an IDX image file. Images get sequential ids starting at 0 and no label.
pub fn read_images<R: Read>(input: &mut R) -> Result<Vec<Image>> {
    let magic = read_u32(input)?;
    if magic != IMAGE_MAGIC {
        return Err(Error::Format(format!("bad magic (images): {}", magic)));
    }
    let count = read_u32(input)? as usize;
    let rows = read_u32(input)? as usize;
    let columns = read_u32(input)? as usize;
    if count == 0 || rows == 0 || columns == 0 {
        return Err(Error::Format(format!(
            "invalid header: {} images of {}x{}",
            count, rows, columns
        )));
    }

    let size = rows
        .checked_mul(columns)
        .filter(|&s| s <= MAX_PIXELS)
        .ok_or_else(|| Error::Format(format!("image size {}x{} too large", rows, columns)))?;

    // header counts are untrusted until the data is actually there
    let mut images = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for id in 0..count {
        let mut pixels = vec![0u8; size];
        input.read_exact(&mut pixels)?;
        images.push(Image::new(rows, columns, pixels, id as i64, None));
    }
    debug!("read {} images of {}x{}", count, rows, columns);
    Ok(images)
}

/// Read an IDX label file
pub fn read_labels<R: Read>(input: &mut R) -> Result<Vec<u8>> {
    let magic = read_u32(input)?;
    if magic != LABEL_MAGIC {
        return Err(Error::Format(format!("bad magic (labels): {}", magic)));
    }
    let count = read_u32(input)? as usize;
    let mut labels = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    input.take(count as u64).read_to_end(&mut labels)?;
    if labels.len() != count {
        return Err(Error::Format(format!(
            "expected {} labels, file holds {}",
            count,
            labels.len()
        )));
    }
    Ok(labels)
}

pub fn write_images<W: Write>(output: &mut W, images: &[Image]) -> Result<()> {
    let (rows, columns) = if images.is_empty() {
        (0, 0)
    } else {
        check_shapes(images)?
    };
    output.write_all(&IMAGE_MAGIC.to_be_bytes())?;
    output.write_all(&(images.len() as u32).to_be_bytes())?;
    output.write_all(&(rows as u32).to_be_bytes())?;
    output.write_all(&(columns as u32).to_be_bytes())?;
    for image in images {
        output.write_all(image.pixels())?;
    }
    Ok(())
}

/// Write each image's label, unknown labels as 255
pub fn write_labels<W: Write>(output: &mut W, images: &[Image]) -> Result<()> {
    output.write_all(&LABEL_MAGIC.to_be_bytes())?;
    output.write_all(&(images.len() as u32).to_be_bytes())?;
    let labels: Vec<u8> = images
        .iter()
        .map(|i| i.label.unwrap_or(UNKNOWN_LABEL))
        .collect();
    output.write_all(&labels)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(magic: u32, rest: &[u32]) -> Vec<u8> {
        std::iter::once(magic)
            .chain(rest.iter().copied())
            .flat_map(u32::to_be_bytes)
            .collect()
    }

    #[test]
    fn reads_images() {
        let mut buf = header(IMAGE_MAGIC, &[2, 2, 3]);
        buf.extend(0..12u8);
        let imgs = read_images(&mut Cursor::new(buf)).unwrap();
        assert_eq!(imgs.len(), 2);
        assert_eq!(imgs[1].shape(), (2, 3));
        assert_eq!(imgs[1].get(1, 2), 11);
        assert_eq!(imgs[1].id, 1);
    }

    #[test]
    fn rejects_bad_files() {
        let buf = header(LABEL_MAGIC, &[1, 1, 1]);
        assert!(matches!(read_images(&mut Cursor::new(buf)), Err(Error::Format(_))));

        let buf = header(IMAGE_MAGIC, &[0, 28, 28]);
        assert!(matches!(read_images(&mut Cursor::new(buf)), Err(Error::Format(_))));

        // truncated pixel data
        let mut buf = header(IMAGE_MAGIC, &[1, 2, 2]);
        buf.extend([1, 2, 3]);
        assert!(matches!(read_images(&mut Cursor::new(buf)), Err(Error::Io(_))));
    }

    #[test]
    fn huge_header_counts() {
        let mut buf = header(IMAGE_MAGIC, &[0xFFFF_FFF0, 1, 1]);
        buf.extend([1, 2, 3]);
        assert!(matches!(read_images(&mut Cursor::new(buf)), Err(Error::Io(_))));

        let buf = header(IMAGE_MAGIC, &[1, 0xFFFF_FFFF, 0xFFFF_FFFF]);
        assert!(matches!(read_images(&mut Cursor::new(buf)), Err(Error::Format(_))));

        let mut buf = header(LABEL_MAGIC, &[0xFFFF_FFF0]);
        buf.extend([1, 2, 3]);
        assert!(matches!(read_labels(&mut Cursor::new(buf)), Err(Error::Format(_))));
    }

    #[test]
    fn labels_written_with_unknown() {
        let imgs = vec![
            Image::new(1, 1, vec![0], 0, Some(4)),
            Image::new(1, 1, vec![0], 1, None),
        ];
        let mut out = Vec::new();
        write_labels(&mut out, &imgs).unwrap();
        assert_eq!(&out[8..], &[4, UNKNOWN_LABEL]);
        assert_eq!(read_labels(&mut Cursor::new(out)).unwrap(), vec![4, UNKNOWN_LABEL]);
    }

    #[test]
    fn written_images_read_back() {
        let imgs = vec![
            Image::new(2, 2, vec![1, 2, 3, 4], 0, None),
            Image::new(2, 2, vec![250, 0, 9, 9], 1, None),
        ];
        let mut out = Vec::new();
        write_images(&mut out, &imgs).unwrap();
        assert_eq!(out.len(), 16 + 8);
        assert_eq!(read_images(&mut Cursor::new(out)).unwrap(), imgs);
    }
}
