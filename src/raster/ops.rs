use super::{Raster, RasterError};

impl Raster {
    /// Nearest neighbour resample
    pub fn resize(&self, width: u32, height: u32) -> Result<Self, RasterError> {
        let bytes_per_pixel = self.bytes_per_pixel()?;
        let mut buffer = vec![0; (width as usize * height as usize) * bytes_per_pixel];

        let scale = (
            self.dimensions.0 as f64 / width as f64,
            self.dimensions.1 as f64 / height as f64,
        );
        for j in 0..height {
            let v = ((j as f64 * scale.1) as u32).min(self.dimensions.1 - 1);
            for i in 0..width {
                let u = ((i as f64 * scale.0) as u32).min(self.dimensions.0 - 1);
                let src = (v as usize * self.dimensions.0 as usize + u as usize) * bytes_per_pixel;
                let dst = (j as usize * width as usize + i as usize) * bytes_per_pixel;
                buffer[dst..dst + bytes_per_pixel]
                    .copy_from_slice(&self.buffer[src..src + bytes_per_pixel]);
            }
        }
        Self::new(
            (width, height),
            buffer,
            self.bits_per_sample.clone(),
            self.interpretation,
            self.sample_format.clone(),
            self.extra_samples.clone(),
            self.endian,
        )
    }

    /// Bytes of the `tile_size` block whose top left pixel is `origin`.
    ///
    /// Blocks hanging over the right or bottom edge are zero padded so every
    /// tile has the full size.
    pub fn tile(&self, origin: (u32, u32), tile_size: (u32, u32)) -> Result<Vec<u8>, RasterError> {
        let bytes_per_pixel = self.bytes_per_pixel()?;
        let row_size = self.row_size();
        let tile_row_size = tile_size.0 as usize * bytes_per_pixel;
        let mut buffer = vec![0; tile_row_size * tile_size.1 as usize];

        let x_end = (origin.0 + tile_size.0).min(self.dimensions.0);
        let y_end = (origin.1 + tile_size.1).min(self.dimensions.1);
        if origin.0 >= x_end || origin.1 >= y_end {
            return Ok(buffer);
        }
        let copy_len = (x_end - origin.0) as usize * bytes_per_pixel;

        for (row, y) in (origin.1..y_end).enumerate() {
            let src = y as usize * row_size + origin.0 as usize * bytes_per_pixel;
            let dst = row * tile_row_size;
            buffer[dst..dst + copy_len].copy_from_slice(&self.buffer[src..src + copy_len]);
        }
        Ok(buffer)
    }
}
