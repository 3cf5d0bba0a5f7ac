//! GPU occlusion-query strategy.
//!
//! Each query point is rasterized as a single point primitive against the
//! occluder-only depth buffer while an any-samples-passed query is active.
//! A point whose sample survives the depth test is visible; a point whose
//! sample is rejected (or clipped away entirely) is occluded.

use occl_core::TestError;

use crate::renderer::SceneRenderer;

/// Run one full query-strategy pass over every point.
///
/// The query set and result buffers are created fresh per run and released
/// when this function returns. Allocation failure aborts the run before
/// any query is issued, leaving the caller's previous result intact.
pub fn run_query_strategy(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    renderer: &SceneRenderer,
) -> Result<Vec<bool>, TestError> {
    let count = renderer.point_count();
    let result_size = u64::from(count) * std::mem::size_of::<u64>() as u64;

    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
        label: Some("occlusion-queries"),
        ty: wgpu::QueryType::Occlusion,
        count,
    });
    let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("occlusion-resolve"),
        size: result_size,
        usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });
    let read_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("occlusion-read"),
        size: result_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(TestError::QueryAlloc(err.to_string()));
    }

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("occlusion-query-encoder"),
    });
    {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("occlusion-query-pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: renderer.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: Some(&query_set),
        });
        rpass.set_pipeline(renderer.probe_pipeline());
        rpass.set_bind_group(0, renderer.bind_group(), &[]);
        rpass.set_vertex_buffer(0, renderer.probe_vb().slice(..));
        for i in 0..count {
            rpass.begin_occlusion_query(i);
            rpass.draw(i..i + 1, 0..1);
            rpass.end_occlusion_query();
        }
    }
    encoder.resolve_query_set(&query_set, 0..count, &resolve_buffer, 0);
    encoder.copy_buffer_to_buffer(&resolve_buffer, 0, &read_buffer, 0, result_size);
    queue.submit(Some(encoder.finish()));

    // The GPU runs asynchronously; block here until the query results have
    // landed before interpreting them.
    let slice = read_buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|e| TestError::QueryReadback(e.to_string()))?
        .map_err(|e| TestError::QueryReadback(e.to_string()))?;

    let data = slice.get_mapped_range();
    let samples: &[u64] = bytemuck::cast_slice(&data);
    let results = samples.iter().map(|&passed| passed == 0).collect();
    drop(data);
    read_buffer.unmap();

    Ok(results)
}
