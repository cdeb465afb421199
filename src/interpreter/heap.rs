use super::*;
use tracing::trace;

impl Interpreter {
    pub(crate) fn allocate_object_slot(&mut self, data: JsObjectData) -> JsObject {
        let id = if let Some(idx) = self.free_list.pop() {
            self.objects[idx] = Some(data);
            idx as u64
        } else {
            self.objects.push(Some(data));
            self.objects.len() as u64 - 1
        };
        JsObject { id }
    }

    /// Frees a slot that no live value refers to. Only transient boxes of
    /// primitives are released this way.
    pub(crate) fn release_object_slot(&mut self, obj: JsObject) {
        let idx = obj.id as usize;
        if let Some(slot) = self.objects.get_mut(idx)
            && slot.take().is_some()
        {
            trace!(id = obj.id, "released object slot");
            self.free_list.push(idx);
        }
    }

    pub(crate) fn object_data(&self, obj: JsObject) -> JsResult<&JsObjectData> {
        self.objects
            .get(obj.id as usize)
            .and_then(Option::as_ref)
            .ok_or(EngineError::InvalidHandle)
    }

    pub(crate) fn object_data_mut(&mut self, obj: JsObject) -> JsResult<&mut JsObjectData> {
        self.objects
            .get_mut(obj.id as usize)
            .and_then(Option::as_mut)
            .ok_or(EngineError::InvalidHandle)
    }

    pub fn live_object_count(&self) -> usize {
        self.objects.len() - self.free_list.len()
    }
}
