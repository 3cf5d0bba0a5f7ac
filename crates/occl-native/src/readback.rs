//! Blocking depth-buffer readback.
//!
//! The whole depth attachment is copied into a mappable buffer once per
//! test run and handed to the CPU classifier as a [`DepthGrid`]. Mapping
//! the buffer is the run's synchronization point: the device is polled
//! until the GPU has finished the copy.

use occl_core::{DepthGrid, TestError};

pub fn read_depth_grid(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    depth_texture: &wgpu::Texture,
) -> Result<DepthGrid, TestError> {
    let width = depth_texture.width();
    let height = depth_texture.height();
    let unpadded_bytes_per_row = width * 4;
    let padded_bytes_per_row =
        unpadded_bytes_per_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("depth-readback"),
        size: u64::from(padded_bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("depth-copy-encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: depth_texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::DepthOnly,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: None,
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = readback.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|e| TestError::Readback(e.to_string()))?
        .map_err(|e| TestError::Readback(e.to_string()))?;

    let data = slice.get_mapped_range();
    let mut texels = Vec::with_capacity((width * height) as usize);
    for row in 0..height {
        let start = (row * padded_bytes_per_row) as usize;
        let end = start + unpadded_bytes_per_row as usize;
        texels.extend_from_slice(bytemuck::cast_slice::<u8, f32>(&data[start..end]));
    }
    drop(data);
    readback.unmap();

    Ok(DepthGrid::new(width, height, texels))
}
