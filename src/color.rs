use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// A RGB color value, normalized to sixteen bits per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color {
    /// Red channel.
    pub red: u16,

    /// Green channel.
    pub green: u16,

    /// Blue channel.
    pub blue: u16,
}

impl Color {
    /// Creates a new color.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::Color;
    /// let color = Color::new(1, 2, 3);
    /// assert_eq!(1, color.red);
    /// assert_eq!(2, color.green);
    /// assert_eq!(3, color.blue);
    /// ```
    pub fn new(red: u16, green: u16, blue: u16) -> Color {
        Color { red, green, blue }
    }

    pub(crate) fn read_from<R: Read>(mut read: R) -> std::io::Result<Color> {
        Ok(Color {
            red: read.read_u16::<LittleEndian>()?,
            green: read.read_u16::<LittleEndian>()?,
            blue: read.read_u16::<LittleEndian>()?,
        })
    }

    pub(crate) fn write_to<W: Write>(&self, mut write: W) -> std::io::Result<()> {
        write.write_u16::<LittleEndian>(self.red)?;
        write.write_u16::<LittleEndian>(self.green)?;
        write.write_u16::<LittleEndian>(self.blue)?;
        Ok(())
    }
}
