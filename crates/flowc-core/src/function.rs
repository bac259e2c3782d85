use crate::block::{BasicBlock, BlockId};
use crate::types::{FunctionType, Type};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub signature: FunctionSignature,
    pub body: FunctionBody,
}

impl Function {
    pub fn new(signature: FunctionSignature) -> Self {
        Self {
            signature,
            body: FunctionBody::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn entry_block(&self) -> BlockId {
        self.body.entry_block
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub ret: Type,
    pub is_variadic: bool,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>, params: Vec<Parameter>, ret: Type) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            is_variadic: false,
        }
    }

    pub fn variadic(name: impl Into<String>, params: Vec<Parameter>, ret: Type) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            is_variadic: true,
        }
    }

    pub fn function_type(&self) -> FunctionType {
        FunctionType {
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
            ret: self.ret.clone(),
            is_variadic: self.is_variadic,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionBody {
    pub entry_block: BlockId,
    /// Serialized as a sequence; JSON maps need string keys.
    #[serde(with = "blocks_as_seq")]
    pub blocks: IndexMap<BlockId, BasicBlock>,
    next_block_id: u32,
    next_temp_id: u32,
}

mod blocks_as_seq {
    use super::{BasicBlock, BlockId};
    use indexmap::IndexMap;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        blocks: &IndexMap<BlockId, BasicBlock>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(blocks.len()))?;
        for block in blocks.values() {
            seq.serialize_element(block)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<BlockId, BasicBlock>, D::Error> {
        let blocks = Vec::<BasicBlock>::deserialize(deserializer)?;
        Ok(blocks.into_iter().map(|b| (b.id, b)).collect())
    }
}

impl FunctionBody {
    pub fn new() -> Self {
        let entry_block = BlockId(0);
        let mut blocks = IndexMap::new();
        blocks.insert(entry_block, BasicBlock::new(entry_block));

        Self {
            entry_block,
            blocks,
            next_block_id: 1,
            next_temp_id: 0,
        }
    }

    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.blocks.insert(id, BasicBlock::new(id));
        id
    }

    pub fn get_block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn get_block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(&id)
    }

    pub fn next_temp(&mut self) -> u32 {
        let id = self.next_temp_id;
        self.next_temp_id += 1;
        id
    }
}

impl Default for FunctionBody {
    fn default() -> Self {
        Self::new()
    }
}
